use tokenwarden::application_port::*;
use tokenwarden::client::Client;
use tokenwarden::domain_model::{AdminUser, Profile};
use tokenwarden::logger::*;
use tokenwarden::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let client = Client::try_new(&project_settings).await?;
    client.auth_service.rehydrate_from_storage().await?;
    client.wait_for_revalidation().await;

    if let Err(e) = run(&client, command).await {
        if e.requires_login() {
            error!("not logged in or session expired, run `tokenwarden login` first");
        }
        return Err(e.into());
    }

    Ok(())
}

async fn run(client: &Client, command: Command) -> Result<(), AuthError> {
    let auth = &client.auth_service;
    match command {
        Command::Login { username, password } => {
            let profile = auth.login(LoginInput { username, password }).await?;
            print_profile(&profile);
        }
        Command::Logout => {
            auth.logout().await;
            println!("logged out");
        }
        Command::Whoami => {
            if !auth.is_authenticated() {
                println!("not logged in");
                return Ok(());
            }
            let profile = match auth.current_user() {
                Some(profile) => profile,
                None => auth.fetch_current_user().await?,
            };
            print_profile(&profile);
        }
        Command::Register {
            username,
            password,
            email,
            password_confirm,
        } => {
            let user = auth
                .register(RegisterInput {
                    username,
                    password,
                    email,
                    password_confirm,
                })
                .await?;
            println!("registered {} (id {})", user.username, user.id);
        }
        Command::ChangePassword {
            current,
            new,
            confirm,
        } => {
            let detail = auth
                .change_password(ChangePasswordInput {
                    current_password: current,
                    new_password: new,
                    new_password_confirm: confirm,
                })
                .await?;
            println!("{}", detail);
        }
        Command::Users { command } => run_users(client, command).await?,
    }
    Ok(())
}

async fn run_users(client: &Client, command: UsersCommand) -> Result<(), AuthError> {
    let admin = &client.user_admin_service;
    match command {
        UsersCommand::List => {
            for user in admin.list_users().await? {
                print_user(&user);
            }
        }
        UsersCommand::Create {
            username,
            email,
            password,
            staff,
            inactive,
        } => {
            let user = admin
                .create_user(CreateUserInput {
                    username,
                    email,
                    password,
                    is_staff: staff,
                    is_active: !inactive,
                })
                .await?;
            print_user(&user);
        }
        UsersCommand::Delete { id } => {
            admin.delete_user(id).await?;
            println!("deleted user {}", id);
        }
        UsersCommand::ResetPassword {
            id,
            password,
            confirm,
        } => {
            let detail = admin
                .reset_password(
                    id,
                    ResetPasswordInput {
                        new_password: password,
                        new_password_confirm: confirm,
                    },
                )
                .await?;
            println!("{}", detail);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!(
        "{} (id {}){}",
        profile.username,
        profile.id,
        if profile.is_staff { " [staff]" } else { "" }
    );
    if let Some(email) = &profile.email {
        println!("email: {}", email);
    }
    println!("joined: {}", profile.date_joined.format("%Y-%m-%d"));
}

fn print_user(user: &AdminUser) {
    println!(
        "{:>6}  {:<24} {:<32} {}{}",
        user.id.to_string(),
        user.username,
        user.email.as_deref().unwrap_or("-"),
        if user.is_staff { "staff " } else { "" },
        if user.is_active { "active" } else { "inactive" }
    );
}
