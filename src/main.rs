use std::path::PathBuf;
use std::sync::Arc;

use order_lookup::cards::OrderCard;
use order_lookup::mailhost::eml::load_mailbox_dir;
use order_lookup::orders::{EnvCredential, OrderClient};
use order_lookup::{InboundTrigger, LookupConfig, OrderLookup};

#[tokio::main]
async fn main() -> order_lookup::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut message_id = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else if message_id.is_none() {
            message_id = Some(arg);
        } else {
            eprintln!("Error: unexpected argument {arg}");
            std::process::exit(2);
        }
    }
    let Some(message_id) = message_id else {
        eprintln!("Usage: order-lookup <message-id> [--json]");
        eprintln!("  export ORDER_LOOKUP_SITE=myshop");
        eprintln!("  export ORDER_LOOKUP_MAILBOX_DIR=./mailbox");
        eprintln!("  export SELLASIST_API_KEY=...");
        eprintln!("  export ORDER_LOOKUP_ACCESS_TOKEN=...   (optional, passed to the mail host)");
        std::process::exit(2);
    };

    let config = LookupConfig::from_env()?;

    let mailbox_dir = std::env::var("ORDER_LOOKUP_MAILBOX_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./mailbox"));
    let host = load_mailbox_dir(&mailbox_dir)?;

    eprintln!("📦 Order lookup v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Site: {}", config.site_name);
    eprintln!("   API: {}", config.api_base_url);
    eprintln!("   Mailbox: {} ({} threads)", mailbox_dir.display(), host.thread_count());
    eprintln!("   Proxy domains: {}\n", config.proxy_domains.join(", "));

    let client = OrderClient::new(&config, Arc::new(EnvCredential::default()))?;

    let mut trigger = InboundTrigger::new(message_id);
    if let Ok(token) = std::env::var("ORDER_LOOKUP_ACCESS_TOKEN") {
        trigger = trigger.with_access_token(secrecy::SecretString::from(token));
    }

    let lookup = OrderLookup::new(config, Arc::new(host), Arc::new(client));
    let outcome = lookup.run(&trigger).await?;
    let card = OrderCard::build(&outcome.customer, &outcome.result, lookup.config());

    if json {
        let body = serde_json::json!({
            "card": card,
            "lookup": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", card.render_text());
    }

    Ok(())
}
