//!
//! tenderguard CLI binary
//! ----------------------
//! Local console for the permission model. The session is persisted to a JSON file between
//! invocations, so `login` in one process and `check` in the next behave like a page reload:
//! the identity comes back from disk and the permission index is rebuilt from its role.

use std::env;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use tenderguard::config::Config;
use tenderguard::error::{AppError, AppResult};
use tenderguard::identity::{Credentials, Identity, RoleAssignment, Session};
use tenderguard::security::{UserDirectory, UserRecord};
use tenderguard::storage::{FileSessionStore, SessionStore, StoreError};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} login <username|email> <password>\n  {program} logout\n  {program} whoami\n  {program} check <page> [read|write|update|delete]\n  {program} department <department_id>\n  {program} hash-password <password>\n  {program} add-user <username> <password> [--role <name>] [--perm <Page_access>]... [--dept <id>] [--email <addr>]\n\nEnvironment:\n  TENDERGUARD_USERS_FILE        JSON user directory (required for login and add-user)\n  TENDERGUARD_SESSION_FILE      persisted session (default .tenderguard/session.json)\n  TENDERGUARD_ALLOW_PLAINTEXT   accept legacy plaintext password records (default false)\n\nExamples:\n  {program} login alice s3cret\n  {program} check \"Admin panel\" write\n  {program} add-user bob pw --role Evaluator --perm Dashboard_read --perm Reports_write --dept d3"
    );
}

#[derive(Debug, PartialEq)]
enum Command {
    Login { username: String, password: String },
    Logout,
    WhoAmI,
    Check { page: String, access: String },
    Department { id: String },
    HashPassword { password: String },
    AddUser { username: String, password: String, role: Option<String>, perms: Vec<String>, dept: Option<String>, email: Option<String> },
    Help,
}

fn usage_err(msg: &str) -> AppError { AppError::user("usage", msg) }

fn parse_args(args: &[String]) -> AppResult<Command> {
    let Some(cmd) = args.first() else { return Ok(Command::Help); };
    let rest = &args[1..];
    let arg = |i: usize, what: &str| rest.get(i).cloned().ok_or_else(|| usage_err(&format!("missing {}", what)));
    match cmd.as_str() {
        "login" => Ok(Command::Login { username: arg(0, "username")?, password: arg(1, "password")? }),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),
        "check" => Ok(Command::Check { page: arg(0, "page")?, access: rest.get(1).cloned().unwrap_or_else(|| "read".into()) }),
        "department" => Ok(Command::Department { id: arg(0, "department id")? }),
        "hash-password" => Ok(Command::HashPassword { password: arg(0, "password")? }),
        "add-user" => {
            let username = arg(0, "username")?;
            let password = arg(1, "password")?;
            let (mut role, mut perms, mut dept, mut email) = (None, Vec::new(), None, None);
            let mut i = 2;
            while i < rest.len() {
                let val = rest.get(i + 1).cloned().ok_or_else(|| usage_err(&format!("{} needs a value", rest[i])))?;
                match rest[i].as_str() {
                    "--role" => role = Some(val),
                    "--perm" => perms.push(val),
                    "--dept" => dept = Some(val),
                    "--email" => email = Some(val),
                    other => return Err(usage_err(&format!("unknown flag {}", other))),
                }
                i += 2;
            }
            Ok(Command::AddUser { username, password, role, perms, dept, email })
        }
        "-h" | "--help" | "help" => Ok(Command::Help),
        other => Err(usage_err(&format!("unknown command {}", other))),
    }
}

fn print_session(session: &Session) {
    match session.authenticated_identity() {
        Some(id) => {
            println!("user:       {} ({})", id.display_name(), id.username);
            println!("role:       {} (rank {})", id.role_name().unwrap_or("-"), id.role_rank());
            println!("department: {}", id.department().unwrap_or("all"));
            for page in session.index().pages() {
                let access: Vec<&str> = session.index().get(page).map(|s| s.iter().map(|a| a.as_str()).collect()).unwrap_or_default();
                println!("  {:<28} {}", page, access.join(","));
            }
        }
        None => println!("not logged in"),
    }
}

/// Restore the persisted session. A file that no longer parses is cleared and read as logged out.
fn restore_session(store: Arc<FileSessionStore>) -> AppResult<Session> {
    match Session::restore(store.clone()) {
        Ok(session) => Ok(session),
        Err(e @ StoreError::Json { .. }) => {
            tracing::warn!(target: "tenderguard::cli", error = %e, "discarding unreadable session file");
            store.clear()?;
            Ok(Session::new(store))
        }
        Err(e) => Err(e.into()),
    }
}

/// Keep the id of a user being replaced; otherwise take the next free `u-<n>`.
fn user_id_for(directory: &UserDirectory, username: &str) -> String {
    if let Some(existing) = directory.users().iter().find(|u| u.identity.matches_login(username)) {
        return existing.identity.id.clone();
    }
    let next = directory
        .users()
        .iter()
        .filter_map(|u| u.identity.id.strip_prefix("u-").and_then(|n| n.parse::<u64>().ok()))
        .max()
        .unwrap_or(0)
        + 1;
    format!("u-{}", next)
}

async fn run(cmd: Command, config: &Config) -> AppResult<()> {
    let store = Arc::new(FileSessionStore::new(&config.session_file));
    match cmd {
        Command::Help => {
            print_usage("tenderguard_cli");
            Ok(())
        }
        Command::Login { username, password } => {
            let directory = config.user_directory()?;
            let mut session = Session::new(store);
            session.login(&Credentials::new(username, password), &directory).await?;
            print_session(&session);
            Ok(())
        }
        Command::Logout => {
            Session::new(store).logout();
            println!("logged out");
            Ok(())
        }
        Command::WhoAmI => {
            print_session(&restore_session(store)?);
            Ok(())
        }
        Command::Check { page, access } => {
            let session = restore_session(store)?;
            let a = access.parse().map_err(|e: tenderguard::permission::UnknownAccessType| AppError::user("access".to_string(), e.to_string()))?;
            let d = session.decide(&page, a);
            println!("{} {} on '{}': {}", if d.allowed { "ALLOW" } else { "DENY" }, access, page, d.reason);
            if d.allowed { Ok(()) } else { Err(AppError::forbidden("denied", d.reason)) }
        }
        Command::Department { id } => {
            let session = restore_session(store)?;
            let allowed = session.can_access_department(&id);
            println!("department {}: {}", id, if allowed { "ALLOW" } else { "DENY" });
            if allowed { Ok(()) } else { Err(AppError::forbidden("denied", "department")) }
        }
        Command::HashPassword { password } => {
            println!("{}", tenderguard::security::hash_password(&password)?);
            Ok(())
        }
        Command::AddUser { username, password, role, perms, dept, email } => {
            let Some(path) = config.users_file.as_ref() else {
                return Err(AppError::config("auth_not_configured", "TENDERGUARD_USERS_FILE is not set"));
            };
            let mut directory = if path.exists() {
                UserDirectory::load(path, config.allow_plaintext_passwords)?
            } else {
                UserDirectory::from_records(Vec::new(), config.allow_plaintext_passwords)
            };
            let id = user_id_for(&directory, &username);
            let mut identity = Identity::new(id, username.clone());
            identity.email = email;
            identity.department_id = dept;
            if let Some(role) = role {
                let tokens: Vec<&str> = perms.iter().map(|s| s.as_str()).collect();
                identity = identity.with_role(RoleAssignment::new(role, &tokens));
            }
            directory.upsert(UserRecord::hashed(identity, &password)?);
            directory.save(path)?;
            println!("saved {} to {}", username, path.display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();
    let result = match parse_args(&args) {
        Ok(cmd) => run(cmd, &config).await,
        Err(e) => {
            print_usage("tenderguard_cli");
            Err(e)
        }
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
