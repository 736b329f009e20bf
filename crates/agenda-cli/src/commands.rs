use std::path::{Path, PathBuf};

use agenda_engine::temporal::{parse_date, parse_time};
use agenda_engine::{
    load_external_events, parse_local_datetime, AgendaConfig, AgendaRecords, AgendaService,
    Category, Event, EventKey, JsonFileStore, Priority,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::Args;

/// Resolved configuration plus the service built from it.
pub struct AppContext {
    service: AgendaService<JsonFileStore>,
}

impl AppContext {
    pub fn load(
        config_path: Option<&Path>,
        data_dir: Option<PathBuf>,
        timezone: Option<&str>,
    ) -> Result<Self> {
        let mut config = match config_path
            .map(Path::to_path_buf)
            .or_else(AgendaConfig::default_path)
        {
            Some(path) => AgendaConfig::load(&path)?,
            None => AgendaConfig::default(),
        };
        if let Some(dir) = data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(tz) = timezone {
            config.timezone = tz.to_string();
        }

        let tz = config.tz()?;
        let dir = config.resolved_data_dir()?;
        tracing::debug!(data_dir = %dir.display(), timezone = %tz, "using agenda store");

        let external = match &config.external_events {
            Some(path) => load_external_events(path)
                .with_context(|| format!("failed to load external events from {}", path.display()))?,
            None => Vec::new(),
        };

        let service = AgendaService::new(JsonFileStore::new(dir))
            .with_timezone(tz)
            .with_external_events(external);
        Ok(Self { service })
    }

    fn resolve_date(&self, date: Option<&str>) -> Result<NaiveDate> {
        match date {
            Some(raw) => Ok(parse_date(raw)?),
            None => Ok(self.service.today(Utc::now())),
        }
    }
}

#[derive(Args, Debug)]
pub struct DateArgs {
    /// Date (YYYY-MM-DD); defaults to today in the configured timezone
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Start of the event (YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub at: String,
    /// Exact title of the event
    #[arg(long)]
    pub title: String,
    /// Category label (Fiscal, Desenvolvimento, Lazer, Pessoal)
    #[arg(long)]
    pub category: String,
}

impl KeyArgs {
    fn to_key(&self) -> Result<EventKey> {
        Ok(EventKey::new(
            parse_local_datetime(&self.at)?,
            self.title.trim(),
            self.category.parse::<Category>()?,
        ))
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    /// Date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
    /// Start time (HH:MM)
    #[arg(long)]
    pub start: String,
    /// End time (HH:MM)
    #[arg(long)]
    pub end: String,
    #[arg(long, default_value = "Pessoal")]
    pub category: String,
    /// Alta, Média, Baixa (or HIGH, MEDIUM, LOW)
    #[arg(long, default_value = "Média")]
    pub priority: String,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    #[arg(long)]
    pub set_title: Option<String>,
    /// New date (YYYY-MM-DD)
    #[arg(long)]
    pub set_date: Option<String>,
    /// New start time (HH:MM)
    #[arg(long)]
    pub set_start: Option<String>,
    /// New end time (HH:MM)
    #[arg(long)]
    pub set_end: Option<String>,
    #[arg(long)]
    pub set_category: Option<String>,
    #[arg(long)]
    pub set_priority: Option<String>,
    /// New notes; an empty string clears them
    #[arg(long)]
    pub set_notes: Option<String>,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn combine(date: NaiveDate, time: &str) -> Result<NaiveDateTime> {
    Ok(date.and_time(parse_time(time)?))
}

pub fn week(ctx: &AppContext, args: &DateArgs) -> Result<()> {
    let anchor = ctx.resolve_date(args.date.as_deref())?;
    let agenda = ctx.service.weekly_agenda(anchor)?;
    print_json(&AgendaRecords::from_agenda(&agenda))
}

pub fn day(ctx: &AppContext, args: &DateArgs) -> Result<()> {
    let date = ctx.resolve_date(args.date.as_deref())?;
    let day = ctx.service.day_agenda(date)?;
    print_json(&day.to_records())
}

pub fn summary(ctx: &AppContext, args: &DateArgs) -> Result<()> {
    let anchor = ctx.resolve_date(args.date.as_deref())?;
    print_json(&ctx.service.weekly_summary(anchor)?)
}

pub fn add(ctx: &AppContext, args: AddArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let event = Event::custom(
        args.title,
        combine(date, &args.start)?,
        combine(date, &args.end)?,
        args.priority.parse::<Priority>()?,
        args.category.parse::<Category>()?,
        args.notes,
    )
    .context("invalid event")?;
    let week = ctx.service.create_event(event)?;
    print_json(&AgendaRecords::from_agenda(&week))
}

pub fn edit(ctx: &AppContext, args: EditArgs) -> Result<()> {
    let key = args.key.to_key()?;
    let current = ctx.service.find_custom_event(&key)?;

    let date = match &args.set_date {
        Some(raw) => parse_date(raw)?,
        None => current.date(),
    };
    let start = match &args.set_start {
        Some(raw) => combine(date, raw)?,
        None => date.and_time(current.start().time()),
    };
    // Without a new end the event keeps its length, so overnight events
    // still end on the following day.
    let end = match &args.set_end {
        Some(raw) => combine(date, raw)?,
        None => start
            .checked_add_signed(current.range().duration())
            .context("event end is out of range")?,
    };
    let priority = match &args.set_priority {
        Some(raw) => raw.parse::<Priority>()?,
        None => current.priority(),
    };
    let category = match &args.set_category {
        Some(raw) => raw.parse::<Category>()?,
        None => current.category(),
    };
    let notes = match args.set_notes {
        Some(notes) => Some(notes),
        None => current.notes().map(str::to_string),
    };
    let title = args
        .set_title
        .unwrap_or_else(|| current.title().to_string());

    let event = Event::custom(title, start, end, priority, category, notes)
        .context("invalid event")?;
    let week = ctx.service.update_event(&key, event)?;
    print_json(&AgendaRecords::from_agenda(&week))
}

pub fn delete(ctx: &AppContext, args: &KeyArgs) -> Result<()> {
    let key = args.to_key()?;
    ctx.service.delete_event(&key)?;
    println!("deleted {key}");
    Ok(())
}

pub fn delete_at(ctx: &AppContext, date: &str, index: usize) -> Result<()> {
    let date = parse_date(date)?;
    ctx.service.delete_event_at(date, index)?;
    println!("deleted event #{index} on {date}");
    Ok(())
}
