//! Subcommand handlers

use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use serde_json::Value;
use std::io::{self, BufRead, Write};

use campus_core::{filter_schools, Access, Console, DashboardSection, School, SchoolDraft};

#[derive(Subcommand)]
pub enum SchoolCommand {
    /// List schools, optionally filtered by name, address or phone
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one school
    Show { id: u64 },
    /// Create a school
    Create {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: SchoolFields,
    },
    /// Change fields of a school
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: SchoolFields,
    },
    /// Delete a school
    Delete { id: u64 },
}

#[derive(clap::Args)]
pub struct SchoolFields {
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    active: Option<bool>,
}

impl SchoolFields {
    fn into_draft(self, name: Option<String>) -> SchoolDraft {
        SchoolDraft {
            name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            is_active: self.active,
        }
    }
}

pub async fn login(console: &Console, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let session = console.login(email, &password).await?;
    println!(
        "Signed in as {} ({}), session valid until {}",
        display_name(&session.user.name, &session.user.email),
        session.user.role,
        session.expires_at.to_rfc3339()
    );
    println!("Landing page: {}", session.user.role.dashboard_path());
    Ok(())
}

pub async fn logout(console: &Console) -> anyhow::Result<()> {
    console.logout().await;
    println!("Signed out");
    Ok(())
}

pub fn status(console: &Console) -> anyhow::Result<()> {
    let manager = console.session();
    println!("State: {}", manager.state());

    if let Some(session) = manager.current_session() {
        let user = &session.user;
        println!("User: {} (id {})", display_name(&user.name, &user.email), user.id);
        println!("Role: {}", user.role);
        if let Some(school) = user.school_name.as_deref() {
            println!("School: {}", school);
        } else if let Some(id) = user.school_id {
            println!("School: #{}", id);
        }
        println!("Expires: {}", session.expires_at.to_rfc3339());
    }
    println!("Landing page: {}", console.landing_path());
    Ok(())
}

pub async fn refresh(console: &Console) -> anyhow::Result<()> {
    let session = console.refresh().await?;
    println!("Token renewed, valid until {}", session.expires_at.to_rfc3339());
    Ok(())
}

pub async fn profile(console: &Console) -> anyhow::Result<()> {
    let user = console.reload_profile().await?;
    print_json(&serde_json::to_value(&user)?)
}

pub fn route(console: &Console, path: &str) -> anyhow::Result<()> {
    match console.resolve(path) {
        Access::Granted => println!("{} -> granted", path),
        Access::NotFound => println!("{} -> no such page", path),
        Access::Login { from } => println!("{} -> /login (return to {})", path, from),
        denied => println!("{} -> {}", path, denied.target().unwrap_or("?")),
    }
    Ok(())
}

pub async fn dashboard(
    console: &Console,
    section: Option<&str>,
    table: Option<&str>,
) -> anyhow::Result<()> {
    require_session(console)?;
    let api = console.dashboard();

    let data = match (section, table) {
        (_, Some(table)) => api.table_status(table).await?,
        (Some(section), None) => {
            let section: DashboardSection = section.parse().map_err(|e: String| anyhow!(e))?;
            api.section(section).await?
        }
        (None, None) => serde_json::to_value(api.dashboard().await?)?,
    };

    print_json(&data)
}

pub async fn schools(console: &Console, command: SchoolCommand) -> anyhow::Result<()> {
    require_session(console)?;
    let api = console.schools();

    match command {
        SchoolCommand::List { search } => {
            let schools = api.list().await?;
            let shown = filter_schools(&schools, search.as_deref().unwrap_or(""));
            if shown.is_empty() {
                println!("No schools found");
            }
            for school in shown {
                print_school(school);
            }
        }
        SchoolCommand::Show { id } => print_json(&serde_json::to_value(api.get(id).await?)?)?,
        SchoolCommand::Create { name, fields } => {
            let school = api.create(&fields.into_draft(Some(name))).await?;
            println!("Created school #{}", school.id);
        }
        SchoolCommand::Update { id, name, fields } => {
            let school = api.update(id, &fields.into_draft(name)).await?;
            print_school(&school);
        }
        SchoolCommand::Delete { id } => {
            api.delete(id).await?;
            println!("Deleted school #{}", id);
        }
    }
    Ok(())
}

fn require_session(console: &Console) -> anyhow::Result<()> {
    if !console.session().is_authenticated() {
        bail!("Not signed in. Run `campus login --email <EMAIL>` first.");
    }
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn display_name<'a>(name: &'a str, email: &'a str) -> &'a str {
    if name.is_empty() {
        email
    } else {
        name
    }
}

fn print_school(school: &School) {
    println!(
        "#{:<5} {:<32} {:<8} {}",
        school.id,
        school.name,
        if school.is_active { "active" } else { "inactive" },
        school.phone.as_deref().unwrap_or("-")
    );
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
