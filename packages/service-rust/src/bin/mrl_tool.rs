//! mrl-tool - inspect, convert and resolve MRL messages from the command line.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use mrl_core::codec::json::value_from_json;
use mrl_core::naming::{self, CaseMode};
use mrl_core::{message_key, message_type_key, mime, Codec, CodecConfig, Message, Value, WireFormat};
use mrl_service::{MethodRegistry, ResolverConfig, StaticDirectory};

#[derive(Parser)]
#[command(name = "mrl-tool")]
#[command(about = "Encode, decode and resolve MRL messages")]
#[command(version)]
struct Cli {
    /// Emit compact JSON instead of pretty-printed JSON
    #[arg(long, global = true, env = "MRL_COMPACT_JSON")]
    compact: bool,

    /// Omit the base64:// prefix on binary envelopes
    #[arg(long, global = true, env = "MRL_NO_ENVELOPE_PREFIX")]
    no_prefix: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true, env = "MRL_LOG_JSON")]
    log_json: bool,

    /// Namespace for bare service type names
    #[arg(
        long,
        global = true,
        env = "MRL_NAMESPACE",
        default_value = naming::DEFAULT_SERVICE_NAMESPACE
    )]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a message and print it in a wire format
    Encode {
        /// Target service name
        target: String,

        /// Method to invoke
        method: String,

        /// Arguments, each parsed as JSON and taken as text if that fails
        args: Vec<String>,

        #[arg(short, long, default_value = "json")]
        format: WireFormat,

        /// Sending service name
        #[arg(long, default_value = "")]
        sender: String,

        /// Sending method name
        #[arg(long, default_value = "")]
        sending_method: String,

        /// Message id (generated if absent)
        #[arg(long)]
        id: Option<u64>,
    },

    /// Decode a payload and print it as JSON
    Decode {
        /// Payload, or `-` to read standard input
        payload: String,

        /// Wire format (detected if absent)
        #[arg(short, long)]
        format: Option<WireFormat>,
    },

    /// Re-encode a payload in another wire format
    Convert {
        /// Payload, or `-` to read standard input
        payload: String,

        /// Target wire format
        #[arg(short, long)]
        to: WireFormat,

        /// Source wire format (detected if absent)
        #[arg(long)]
        from: Option<WireFormat>,
    },

    /// Print the type key of a payload, or its message key with --with-id
    Key {
        /// Payload, or `-` to read standard input
        payload: String,

        #[arg(long)]
        with_id: bool,
    },

    /// Print the media type registered for an API key
    Mime {
        key: String,
    },

    /// Apply a naming transform
    Name {
        #[arg(value_enum)]
        transform: NameTransform,

        text: String,

        /// Letter case for the underscore transform
        #[arg(long, value_enum, default_value = "lower")]
        case: Case,
    },

    /// Resolve a payload's method against an operation directory document
    Resolve {
        /// Payload, or `-` to read standard input
        payload: String,

        /// Service type of the message target
        #[arg(short = 't', long)]
        service_type: String,

        /// JSON document of the form {"Type": [{"name": .., "params": [..]}]}
        #[arg(short, long)]
        directory: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NameTransform {
    Callback,
    Camel,
    Underscore,
    Capitalize,
    Full,
    Simple,
}

#[derive(Clone, Copy, ValueEnum)]
enum Case {
    Lower,
    Upper,
    Preserve,
}

impl From<Case> for CaseMode {
    fn from(case: Case) -> Self {
        match case {
            Case::Lower => CaseMode::Lower,
            Case::Upper => CaseMode::Upper,
            Case::Preserve => CaseMode::Preserve,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let codec = Codec::new(CodecConfig {
        pretty_print: !cli.compact,
        envelope_prefix: !cli.no_prefix,
    });

    match cli.command {
        Commands::Encode {
            target,
            method,
            args,
            format,
            sender,
            sending_method,
            id,
        } => {
            let mut msg = Message::new(target, method, args.iter().map(|a| parse_arg(a)).collect())
                .with_sender(sender, sending_method);
            if let Some(id) = id {
                msg = msg.with_id(id);
            }
            println!("{}", codec.try_encode(&msg, format)?);
        }
        Commands::Decode { payload, format } => {
            let msg = decode(&codec, &read_payload(&payload)?, format)?;
            println!("{}", codec.try_encode(&msg, WireFormat::Json)?);
        }
        Commands::Convert { payload, to, from } => {
            let msg = decode(&codec, &read_payload(&payload)?, from)?;
            println!("{}", codec.try_encode(&msg, to)?);
        }
        Commands::Key { payload, with_id } => {
            let msg = decode(&codec, &read_payload(&payload)?, None)?;
            let key = if with_id {
                message_key(&msg)
            } else {
                message_type_key(&msg)
            };
            println!("{key}");
        }
        Commands::Mime { key } => {
            println!("{}", mime::mime_type_for(&key));
        }
        Commands::Name {
            transform,
            text,
            case,
        } => {
            let out = match transform {
                NameTransform::Callback => naming::callback_topic_name(&text)?,
                NameTransform::Camel => naming::to_camel_case(&text)?,
                NameTransform::Underscore => naming::to_under_score(&text, case.into())?,
                NameTransform::Capitalize => naming::capitalize(&text)?,
                NameTransform::Full => naming::qualify_type_name(&text, &cli.namespace)?,
                NameTransform::Simple => naming::simple_name(&text).to_string(),
            };
            println!("{out}");
        }
        Commands::Resolve {
            payload,
            service_type,
            directory,
        } => {
            let document = std::fs::read_to_string(&directory)
                .with_context(|| format!("reading {}", directory.display()))?;
            let directory = StaticDirectory::with_namespace(cli.namespace.clone());
            directory.extend_from_json(&document)?;
            let registry = MethodRegistry::new(
                Arc::new(directory),
                ResolverConfig {
                    default_namespace: cli.namespace,
                },
            );
            let msg = decode(&codec, &read_payload(&payload)?, None)?;
            let resolved = registry.try_resolve(&service_type, &msg.method, &msg.args)?;
            println!("{}", resolved.method);
            for arg in &resolved.args {
                println!("  {}", codec.to_json(&mrl_core::codec::json::value_to_json(arg)?)?);
            }
        }
    }
    Ok(())
}

/// Parses a command-line argument as JSON, falling back to plain text.
fn parse_arg(arg: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(arg)
        .map_or_else(|_| Value::String(arg.to_string()), value_from_json)
}

fn read_payload(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading payload from stdin")?;
        Ok(buf)
    } else {
        Ok(arg.to_string())
    }
}

fn decode(codec: &Codec, payload: &str, format: Option<WireFormat>) -> anyhow::Result<Message> {
    let msg = match format {
        Some(format) => codec.try_decode(payload, format)?,
        None => match WireFormat::detect(payload) {
            Some(format) => codec.try_decode(payload, format)?,
            None => bail!("cannot tell the wire format of the payload, pass --format"),
        },
    };
    tracing::debug!(message = %message_type_key(&msg), "decoded payload");
    Ok(msg)
}
