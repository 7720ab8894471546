//! pitchmix-view - Situational Pitch Recommendation Viewer
//!
//! Thin text front-end over the view pipeline: loads the roster, applies the
//! requested pitcher and situation, then prints the usage table for the live
//! count, the recommendation card, and the classified location summary.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pitchmix_common::config::resolve_api_base_url;
use pitchmix_common::events::EventBus;
use pitchmix_common::types::{Hand, Pitcher};
use pitchmix_view::{PitchMixApi, PitchMixClient, ViewSession};

#[derive(Parser, Debug)]
#[command(name = "pitchmix-view", about = "Situational pitch recommendation viewer")]
struct Args {
    /// Analytics API base URL (overrides PITCHMIX_API_URL and config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Pitcher to select, by id or exact name. Omit to list the roster.
    #[arg(long)]
    pitcher: Option<String>,

    /// Ball count (0-3)
    #[arg(long, default_value_t = 1)]
    balls: u8,

    /// Strike count (0-2)
    #[arg(long, default_value_t = 2)]
    strikes: u8,

    /// Batter handedness: L or R
    #[arg(long, default_value = "L")]
    batter_hand: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting pitchmix-view");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let base_url = resolve_api_base_url(args.api_url.as_deref());
    info!("API base URL: {}", base_url);

    let client = PitchMixClient::new(&base_url)
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;

    // Startup diagnostics only; an unreachable health endpoint is not fatal
    if let Err(e) = client.health().await {
        warn!("Health probe failed: {}", e);
    }

    let event_bus = EventBus::new(100);
    let mut session = ViewSession::new(client, event_bus.clone());

    // Log committed pipeline transitions in the background
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(?event, "view event");
        }
    });

    session
        .load_roster()
        .await
        .map_err(|e| anyhow::anyhow!("Could not load pitcher roster: {}", e))?;

    let Some(pitcher_arg) = args.pitcher else {
        print_roster(session.pitchers());
        return Ok(());
    };

    let pitcher_id = find_pitcher(session.pitchers(), &pitcher_arg)
        .ok_or_else(|| anyhow::anyhow!("No pitcher matching '{}'", pitcher_arg))?;

    // Set the situation before selecting so the selection runs one cascade
    let batter_hand: Hand = args
        .batter_hand
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    session.set_balls(args.balls).await?;
    session.set_strikes(args.strikes).await?;
    session.set_batter_hand(batter_hand).await?;

    if let Err(e) = session.select_pitcher(Some(pitcher_id)).await {
        // Recommendation failures are user-visible; render what we have
        eprintln!("error: {}", e);
    }

    render(&session);

    Ok(())
}

fn find_pitcher(pitchers: &[Pitcher], arg: &str) -> Option<i64> {
    if let Ok(id) = arg.parse::<i64>() {
        if pitchers.iter().any(|p| p.id == id) {
            return Some(id);
        }
    }
    pitchers
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(arg))
        .map(|p| p.id)
}

fn print_roster(pitchers: &[Pitcher]) {
    println!("Available pitchers:");
    for p in pitchers {
        println!("  {:>6}  {}  ({})", p.id, p.name, p.throws_hand);
    }
}

fn render<A: PitchMixApi>(session: &ViewSession<A>) {
    let situation = session.situation();
    println!(
        "\nSituation: {} count, {}HB",
        situation.count_key(),
        situation.batter_hand
    );

    match session.usage_for_current_count() {
        Some(entries) => {
            println!("\nUsage ({} count):", situation.count_key());
            println!("  {:<6} {:>6} {:>8} {:>9}", "type", "total", "whiff%", "hardhit%");
            for e in entries {
                println!(
                    "  {:<6} {:>6} {:>7.1}% {:>8.1}%",
                    e.pitch_type,
                    e.total,
                    e.whiff_pct * 100.0,
                    e.hard_hit_pct * 100.0
                );
            }
        }
        None => println!("\nUsage: no data for this count"),
    }

    match session.recommendation() {
        Some(rec) => {
            println!(
                "\nRecommendation: {} (confidence {:.0}%)",
                rec.recommended_pitch_type,
                rec.confidence * 100.0
            );
            for line in &rec.rationale {
                println!("  - {}", line);
            }
            println!(
                "  sample={} whiff={:.1}% hard-hit-in-play={:.1}%",
                rec.historical_outcomes.sample_size,
                rec.historical_outcomes.whiff_pct * 100.0,
                rec.historical_outcomes.in_play_hard_hit_pct * 100.0
            );
        }
        None => println!("\nRecommendation: unavailable"),
    }

    if let Some(zone) = session.zone() {
        println!("\nStrike zone: top {:.2}, bottom {:.2}", zone.top, zone.bot);
    }

    let locations = session.locations();
    if locations.is_empty() {
        println!("Locations: none");
    } else {
        let (whiffs, hits_in_play, other) =
            pitchmix_view::classify::count_categories(locations);
        println!(
            "Locations: {} points ({} whiff, {} hit-in-play, {} other)",
            locations.len(),
            whiffs,
            hits_in_play,
            other
        );
    }
}
