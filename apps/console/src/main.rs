use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    ClientEvent, ControlClient, ControlEndpoint, JobControls, SettingsForm, UiState,
};
use shared::{domain::ClassificationType, protocol::JobSettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

mod config;

#[derive(Parser, Debug)]
#[command(about = "Console frontend for a live 2D classification backend")]
struct Args {
    /// Backend host (overrides console.toml and LIVE2D_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Backend port (overrides console.toml and LIVE2D_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Connect over wss instead of ws.
    #[arg(long)]
    secure: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings();

    let endpoint = ControlEndpoint {
        host: args.host.unwrap_or(settings.host),
        port: args.port.or(settings.port),
        secure: args.secure || settings.secure,
    };

    let client = ControlClient::new();
    let mut events = client.subscribe_events();
    client
        .connect(&endpoint)
        .await
        .with_context(|| format!("cannot reach the control backend at {}", endpoint.url()))?;
    println!("Connected to {}. Type `help` for commands.", endpoint.url());

    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(ClientEvent::Disconnected) => {
                    render_event(ClientEvent::Disconnected);
                    break;
                }
                Ok(event) => render_event(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("renderer lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(err) = run_command(&client, line).await {
            println!("! {err:#}");
        }
    }
    Ok(())
}

async fn run_command(client: &ControlClient, line: &str) -> Result<()> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb {
        "help" => print_help(),
        "status" => {
            render_ui(&client.ui_state().await);
            if let Some(form) = client.settings_form().await {
                render_form(&form);
            }
        }
        "start" => {
            ensure_enabled(client, |controls| controls.start_job, "start-job").await?;
            client.start_job().await?;
        }
        "listen" => {
            ensure_enabled(client, |controls| controls.start_listening, "start-listening")
                .await?;
            client.start_listening().await?;
        }
        "stop" => {
            ensure_enabled(client, |controls| controls.stop_job, "stop-job").await?;
            client.kill_job().await?;
        }
        "dir" => {
            if rest.is_empty() {
                bail!("usage: dir <path>");
            }
            ensure_enabled(client, |controls| controls.change_directory, "directory-change")
                .await?;
            client.change_directory(rest).await?;
        }
        "gallery" => {
            let page: i64 = rest.parse().context("usage: gallery <page>")?;
            client.request_gallery(page).await?;
        }
        "push" => client.update_settings().await?,
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .context("usage: set <field> <value>")?;
            let field = field.to_string();
            let value = value.trim().to_string();
            let mut outcome = Ok(());
            client
                .edit_settings(|fields| outcome = apply_field(fields, &field, &value))
                .await?;
            outcome?;
        }
        other => bail!("unknown command `{other}`; try `help`"),
    }
    Ok(())
}

/// The projector decides what is offered; anything its table disables is
/// refused here instead of being bounced off the backend.
async fn ensure_enabled(
    client: &ControlClient,
    pick: impl Fn(&JobControls) -> bool,
    action: &str,
) -> Result<()> {
    let state = client.ui_state().await;
    if pick(&state.controls) {
        return Ok(());
    }
    let status = if state.status_label.is_empty() {
        "not synced yet"
    } else {
        state.status_label.as_str()
    };
    bail!("{action} is disabled ({status})");
}

fn apply_field(fields: &mut JobSettings, field: &str, value: &str) -> Result<()> {
    match field {
        "classification_type" => {
            fields.classification_type = match value {
                "abinit" => ClassificationType::Abinit,
                "seeded" => ClassificationType::Seeded,
                "refine" => ClassificationType::Refine,
                other => bail!("unknown classification type `{other}`"),
            };
        }
        "mask_radius" => fields.mask_radius = value.to_string(),
        "high_res_initial" => fields.high_res_initial = value.to_string(),
        "high_res_final" => fields.high_res_final = value.to_string(),
        "run_count_startup" => fields.run_count_startup = value.to_string(),
        "run_count_refine" => fields.run_count_refine = value.to_string(),
        "particle_count_initial" => fields.particle_count_initial = value.to_string(),
        "particle_count_update" => fields.particle_count_update = value.to_string(),
        "class_number" => fields.class_number = value.to_string(),
        "particles_per_class" => fields.particles_per_class = value.to_string(),
        "autocenter" => fields.autocenter = parse_bool(value)?,
        "automask" => fields.automask = parse_bool(value)?,
        other => bail!("unknown settings field `{other}`"),
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => bail!("expected a boolean, got `{other}`"),
    }
}

fn render_event(event: ClientEvent) {
    match event {
        ClientEvent::Ui(state) => render_ui(&state),
        ClientEvent::Settings(form) => render_form(&form),
        ClientEvent::Console(text) => render_pane("console", &text),
        ClientEvent::Gallery(html) => render_pane("gallery", &html),
        ClientEvent::Notice(text) => println!("*** {text}"),
        ClientEvent::ProtocolError(text) => println!("!!! {text}"),
        ClientEvent::Disconnected => {
            println!("!!! connection lost; restart the console to resync");
        }
    }
}

fn render_pane(name: &str, content: &str) {
    println!("--- {name} ---");
    println!("{content}");
}

fn render_ui(state: &UiState) {
    println!(
        "[{}] dir:{} start:{} listen:{} stop:{} form:{}",
        state.status_label,
        mark(state.controls.change_directory),
        mark(state.controls.start_job),
        mark(state.controls.start_listening),
        mark(state.controls.stop_job),
        mark(state.form_enabled),
    );
    if state.form_enabled {
        println!(
            "    gated fields: run_count_startup:{} high_res_initial:{} particles_per_class:{} class_number:{}",
            mark(state.gates.run_count_startup),
            mark(state.gates.high_res_initial),
            mark(state.gates.particles_per_class),
            mark(state.gates.class_number),
        );
    }
}

fn mark(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn render_form(form: &SettingsForm) {
    println!("--- settings [{}] ---", form.folder_name);
    let fields = &form.fields;
    println!("classification_type    = {}", fields.classification_type.as_str());
    println!("mask_radius            = {}", fields.mask_radius);
    println!("high_res_initial       = {}", fields.high_res_initial);
    println!("high_res_final         = {}", fields.high_res_final);
    println!("run_count_startup      = {}", fields.run_count_startup);
    println!("run_count_refine       = {}", fields.run_count_refine);
    println!("particle_count_initial = {}", fields.particle_count_initial);
    println!("particle_count_update  = {}", fields.particle_count_update);
    println!("class_number           = {}", fields.class_number);
    println!("particles_per_class    = {}", fields.particles_per_class);
    println!("autocenter             = {}", fields.autocenter);
    println!("automask               = {}", fields.automask);
    if let Some(neural_net) = &fields.neural_net {
        println!("neural_net             = {neural_net}");
    }
    if let Some(pixel_size) = fields.pixel_size {
        println!("pixel_size             = {pixel_size}");
    }
    if form.force_abinit {
        println!("next run is forced back to ab-initio classification");
    }
}

fn print_help() {
    println!("commands:");
    println!("  status               show the current status line and form");
    println!("  start                submit the form and start a job");
    println!("  listen               submit the form and wait for new particles");
    println!("  stop                 ask the backend to kill the current job");
    println!("  dir <path>           switch to another warp directory");
    println!("  gallery <page>       fetch a gallery page");
    println!("  set <field> <value>  edit a form field locally");
    println!("  push                 send the form without starting anything");
    println!("  quit                 leave the console");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> JobSettings {
        JobSettings {
            classification_type: ClassificationType::Abinit,
            mask_radius: "100".to_string(),
            high_res_initial: "40".to_string(),
            high_res_final: "8".to_string(),
            run_count_startup: "15".to_string(),
            run_count_refine: "5".to_string(),
            particle_count_initial: "15000".to_string(),
            particle_count_update: "50000".to_string(),
            class_number: "50".to_string(),
            particles_per_class: "300".to_string(),
            autocenter: true,
            automask: false,
            neural_net: None,
            pixel_size: None,
        }
    }

    #[test]
    fn set_passes_values_through_as_opaque_strings() {
        let mut fields = sample_fields();
        apply_field(&mut fields, "mask_radius", "not even a number").expect("opaque");
        assert_eq!(fields.mask_radius, "not even a number");
    }

    #[test]
    fn set_parses_classification_and_booleans() {
        let mut fields = sample_fields();
        apply_field(&mut fields, "classification_type", "refine").expect("known type");
        assert_eq!(fields.classification_type, ClassificationType::Refine);
        apply_field(&mut fields, "automask", "yes").expect("boolean");
        assert!(fields.automask);
        apply_field(&mut fields, "autocenter", "off").expect("boolean");
        assert!(!fields.autocenter);
    }

    #[test]
    fn set_refuses_unknown_fields_and_bad_values() {
        let mut fields = sample_fields();
        assert!(apply_field(&mut fields, "box_size", "512").is_err());
        assert!(apply_field(&mut fields, "classification_type", "magic").is_err());
        assert!(apply_field(&mut fields, "automask", "sideways").is_err());
        assert_eq!(fields, sample_fields());
    }
}
