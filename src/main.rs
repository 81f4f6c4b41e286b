mod render;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use visitboard_chat::{ChatError, ChatTopic, TopicFollower};
use visitboard_core::{App, AppError};
use visitboard_schedule::{EventStatus, EventType, NoticeType, RegistrationForm, SettingsEdit, TextKey, WeekRange};

#[derive(Parser)]
#[command(name = "visitboard", version, about = "Weekly visit scheduling board")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the week grid
    Week {
        /// Weeks from the current one (negative for past weeks)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Register for an open slot
    Register {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        slot: String,
        /// Form values as id=value, repeatable
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Ads shown when the board is opened
    Ads,
    /// Notices for visitors and escorts
    Notices,
    /// Coordinator operations
    Admin {
        #[arg(long)]
        password: String,
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Discussion board
    Chat {
        #[command(subcommand)]
        action: ChatCommand,
    },
    /// Keep polling and redraw the grid whenever it changes
    Watch {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Ask the assistant about gaps in the schedule
    Analyze,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List registrations, newest first
    Events,
    Delete { id: String },
    Confirm { id: String },
    Unconfirm { id: String },
    SlotAdd,
    SlotUpdate {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// escort or visitor
        #[arg(long, value_parser = parse_event_type)]
        kind: Option<EventType>,
    },
    SlotRemove { id: String },
    /// Toggle a form field's required flag, or its public flag with --public
    FieldToggle {
        id: String,
        #[arg(long)]
        public: bool,
    },
    NoticeAdd,
    NoticeUpdate {
        id: String,
        #[arg(long)]
        text: Option<String>,
        /// safety, escort, visitor or general
        #[arg(long, value_parser = parse_notice_type)]
        kind: Option<NoticeType>,
    },
    NoticeRemove { id: String },
    AdAdd,
    AdUpdate {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    AdRemove { id: String },
    /// Set a text: coordinator-name, coordinator-phone, safety-note,
    /// system-note, friday-message or saturday-message
    Text {
        #[arg(value_parser = parse_text_key)]
        key: TextKey,
        value: String,
    },
}

#[derive(Subcommand)]
enum ChatCommand {
    Register { name: String, pass: String },
    Login { name: String, pass: String },
    Topics,
    NewTopic {
        #[arg(long)]
        user: String,
        #[arg(long)]
        pass: String,
        title: String,
    },
    Post {
        #[arg(long)]
        user: String,
        #[arg(long)]
        pass: String,
        topic: String,
        text: String,
    },
    Show {
        topic: String,
        /// Keep printing new messages until interrupted
        #[arg(long)]
        follow: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected id=value, got {s:?}"))
}

fn parse_event_type(s: &str) -> Result<EventType, String> {
    match s {
        "escort" => Ok(EventType::Escort),
        "visitor" => Ok(EventType::Visitor),
        _ => Err(format!("unknown slot type {s:?}")),
    }
}

fn parse_notice_type(s: &str) -> Result<NoticeType, String> {
    match s {
        "safety" => Ok(NoticeType::Safety),
        "escort" => Ok(NoticeType::Escort),
        "visitor" => Ok(NoticeType::Visitor),
        "general" => Ok(NoticeType::General),
        _ => Err(format!("unknown notice type {s:?}")),
    }
}

fn parse_text_key(s: &str) -> Result<TextKey, String> {
    TextKey::parse(s).ok_or_else(|| format!("unknown text {s:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    visitboard_core::init()?;

    let app = App::new().context("Failed to start")?;
    let result = run(&app, cli.command).await;
    app.shutdown();

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        match e.downcast_ref::<AppError>() {
            Some(app_err) => eprintln!("{}", app_err.user_message()),
            None => eprintln!("{:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &App, command: Command) -> Result<()> {
    let board = app.board();

    match command {
        Command::Week { offset } => {
            print!("{}", render::ads(&board.ads_on_entry().await));
            println!("{}", render::week(&board.week(offset).await));
        }
        Command::Register { date, slot, fields } => {
            let mut form = RegistrationForm::new(date, slot);
            for (id, value) in fields {
                form.set(id, value);
            }
            let event = board.register(form).await?;
            println!("נרשמת בהצלחה ({} {})", event.date, event.slot_id);
        }
        Command::Ads => print!("{}", render::ads(&board.ads_on_entry().await)),
        Command::Notices => println!("{}", render::notices(&board.notices().await)),
        Command::Admin { password, action } => admin(app, &password, action).await?,
        Command::Chat { action } => chat(app, action).await?,
        Command::Watch { offset } => watch(app, offset).await?,
        Command::Analyze => println!("{}", board.analyze().await),
    }
    Ok(())
}

async fn admin(app: &App, password: &str, action: AdminCommand) -> Result<()> {
    let session = app.board().admin(password)?;

    let edit = match action {
        AdminCommand::Events => {
            println!("{}", render::events(&session.events().await));
            return Ok(());
        }
        AdminCommand::Delete { id } => {
            session.delete_event(&id).await?;
            return Ok(());
        }
        AdminCommand::Confirm { id } => {
            session.set_status(&id, EventStatus::Confirmed).await?;
            return Ok(());
        }
        AdminCommand::Unconfirm { id } => {
            session.set_status(&id, EventStatus::Pending).await?;
            return Ok(());
        }
        AdminCommand::SlotAdd => SettingsEdit::AddSlot,
        AdminCommand::SlotUpdate {
            id,
            label,
            start,
            end,
            kind,
        } => SettingsEdit::UpdateSlot {
            id,
            label,
            start_time: start,
            end_time: end,
            slot_type: kind,
        },
        AdminCommand::SlotRemove { id } => SettingsEdit::RemoveSlot { id },
        AdminCommand::FieldToggle { id, public: true } => SettingsEdit::ToggleFieldPublic { id },
        AdminCommand::FieldToggle { id, public: false } => SettingsEdit::ToggleFieldRequired { id },
        AdminCommand::NoticeAdd => SettingsEdit::AddNotice,
        AdminCommand::NoticeUpdate { id, text, kind } => SettingsEdit::UpdateNotice {
            id,
            text,
            notice_type: kind,
        },
        AdminCommand::NoticeRemove { id } => SettingsEdit::RemoveNotice { id },
        AdminCommand::AdAdd => SettingsEdit::AddAd,
        AdminCommand::AdUpdate {
            id,
            title,
            description,
            link,
            image,
        } => SettingsEdit::UpdateAd {
            id,
            title,
            description,
            link,
            image_url: image,
        },
        AdminCommand::AdRemove { id } => SettingsEdit::RemoveAd { id },
        AdminCommand::Text { key, value } => SettingsEdit::SetText { key, value },
    };

    if let Some(id) = session.edit(edit).await? {
        println!("{}", id);
    }
    Ok(())
}

async fn chat(app: &App, action: ChatCommand) -> Result<()> {
    let board = app.board();

    match action {
        ChatCommand::Register { name, pass } => {
            board.register_chat_user(&name, &pass).await?;
            println!("נרשמת בהצלחה! כעת ניתן להתחבר.");
        }
        ChatCommand::Login { name, pass } => {
            let session = board.chat_login(&name, &pass).await?;
            println!("{}", session.name());
        }
        ChatCommand::Topics => println!("{}", render::topics(&board.topics().await)),
        ChatCommand::NewTopic { user, pass, title } => {
            let session = board.chat_login(&user, &pass).await?;
            let topic = board.create_topic(&session, &title).await?;
            println!("{}", topic.id);
        }
        ChatCommand::Post {
            user,
            pass,
            topic,
            text,
        } => {
            let session = board.chat_login(&user, &pass).await?;
            board.post(&session, &topic, &text).await?;
        }
        ChatCommand::Show { topic, follow } => {
            let Some(active) = board.topic(&topic).await else {
                anyhow::bail!(AppError::from(ChatError::TopicNotFound(topic)));
            };
            print!("{}", render::topic(&active));
            if follow {
                follow_topic(app, active).await;
            }
        }
    }
    Ok(())
}

async fn follow_topic(app: &App, active: ChatTopic) {
    let handles = app.watch();
    let mut topics = handles.topics.subscribe();
    let mut follower = TopicFollower::new(active);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = topics.changed() => {
                if changed.is_err() { break; }
                let fresh = follower.poll(&topics.borrow_and_update());
                print!("{}", render::messages(&fresh));
            }
        }
    }

    app.shutdown();
    handles.stop().await;
}

async fn watch(app: &App, offset: i32) -> Result<()> {
    let handles = app.watch();
    let mut events = handles.events.subscribe();
    let mut settings = handles.settings.subscribe();

    let draw = |handles: &visitboard_core::BoardWatch| {
        let view = handles.view(WeekRange::current(offset));
        println!("{}", render::week(&view));
    };

    print!("{}", render::ads(&app.board().ads_on_entry().await));
    handles.events.refresh_now().await;
    handles.settings.refresh_now().await;
    draw(&handles);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = events.changed() => {
                if changed.is_err() { break; }
                draw(&handles);
            }
            changed = settings.changed() => {
                if changed.is_err() { break; }
                draw(&handles);
            }
        }
    }

    app.shutdown();
    handles.stop().await;
    Ok(())
}
