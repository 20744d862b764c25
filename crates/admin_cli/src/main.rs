use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, NewIdentity};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "attendance_admin")]
#[command(about = "Admin utilities for the attendance service (bootstrap admins, inspect roles)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./attendance.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Admin(Admin),
    User(User),
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Create an admin identity (no profile); the password is prompted.
    Create(AdminCreateArgs),
    /// List admin identities.
    List,
    /// Set the admin flag on an existing identity.
    Grant(EmailArgs),
    /// Clear the admin flag.
    Revoke(EmailArgs),
}

#[derive(Args, Debug)]
struct AdminCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
}

#[derive(Args, Debug)]
struct EmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Print the role derived from the identity's profiles.
    Role(EmailArgs),
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn exit_on_engine_error(err: EngineError) -> ! {
    match err.field() {
        Some(field) => eprintln!("{field}: {err}"),
        None => eprintln!("{err}"),
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Admin(Admin {
            command: AdminCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let admin = engine
                .create_admin(NewIdentity {
                    email: args.email,
                    first_name: args.first_name,
                    last_name: args.last_name,
                    password: Some(password),
                })
                .await
                .unwrap_or_else(|err| exit_on_engine_error(err));

            println!("created admin: {} ({})", admin.username, admin.email);
        }
        Command::Admin(Admin {
            command: AdminCommand::List,
        }) => {
            for admin in engine.list_admins().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    admin.id,
                    admin.username,
                    admin.email,
                    admin.full_name()
                );
            }
        }
        Command::Admin(Admin {
            command: AdminCommand::Grant(args),
        }) => {
            let identity = engine
                .identity_by_email(&args.email)
                .await
                .unwrap_or_else(|err| exit_on_engine_error(err));
            engine.set_admin(identity.id, true).await?;
            println!("granted admin: {}", identity.email);
        }
        Command::Admin(Admin {
            command: AdminCommand::Revoke(args),
        }) => {
            let identity = engine
                .identity_by_email(&args.email)
                .await
                .unwrap_or_else(|err| exit_on_engine_error(err));
            engine.set_admin(identity.id, false).await?;
            println!("revoked admin: {}", identity.email);
        }
        Command::User(User {
            command: UserCommand::Role(args),
        }) => {
            let identity = engine
                .identity_by_email(&args.email)
                .await
                .unwrap_or_else(|err| exit_on_engine_error(err));
            let role = engine.role_of(identity.id).await?;
            let staff = engine.is_staff(&identity).await?;
            println!(
                "{}: {} (staff: {})",
                identity.email,
                role.as_str(),
                if staff { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
