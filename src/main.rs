//! Goalreach - adaptive goal-region sampling demo
//!
//! Samples goals in a toy box scene on a background thread while a planner loop
//! draws them, rewarding goals it can reach in a straight line and penalizing
//! the rest. A second thread grows a roadmap over the same scene.

mod roadmap;
mod scene;
mod settings;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec3;
use goalreach_region::{GoalRegion, RegionError};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::roadmap::BoxRoadmap;
use crate::scene::BoxScene;
use crate::settings::DemoSettings;

/// Candidates proposed per sampler call
const CANDIDATES_PER_CALL: usize = 4;

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG wins over the settings file
    let builder = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_names(true)
        .with_filter_reloading();
    let filter = builder.reload_handle();
    tracing::subscriber::set_global_default(builder.finish())
        .context("Failed to set subscriber")?;

    let settings = DemoSettings::load();
    if std::env::var_os("RUST_LOG").is_none() {
        filter
            .reload(EnvFilter::new(&settings.log_level))
            .context("Failed to apply log level")?;
    }
    if !DemoSettings::exists() {
        if let Err(e) = settings.save() {
            warn!("Could not write default settings: {}", e);
        }
    }

    info!("Starting goalreach demo...");

    let scene = Arc::new(BoxScene::new(settings.scene.clone()));
    let roadmap = Arc::new(BoxRoadmap::new(
        Arc::clone(&scene),
        settings.connect_radius,
        settings.max_milestones,
    ));

    let sampler_scene = Arc::clone(&scene);
    let region = GoalRegion::builder(Arc::clone(&scene))
        .config(settings.region.clone())
        .sampler(move |_, out| {
            let mut rng = rand::thread_rng();
            out.extend((0..CANDIDATES_PER_CALL).map(|_| sampler_scene.random_point(&mut rng)));
        })
        .roadmap(roadmap)
        .new_state_callback(|goal: &Vec3| debug!("New goal at {}", goal))
        .build()
        .context("Failed to build goal region")?;

    region.start_growing_roadmap()?;
    region.start_sampling()?;

    // The sampler waits until the scene reports ready
    thread::sleep(Duration::from_millis(20));
    scene.mark_ready();

    let reached = plan(&region, &scene, settings.rounds)?;

    if let Some(report) = region.stop_sampling() {
        info!(
            "Sampling finished ({:?}): {} attempts, {} goals accepted",
            report.outcome, report.attempts, report.accepted
        );
    }
    if let Some(report) = region.stop_growing_roadmap() {
        info!(
            "Roadmap finished: {} milestones, {} edges in {} iterations",
            report.milestones, report.edges, report.iterations
        );
    }

    let goals = region.goals();
    info!(
        "Reached {} of {} goals drawn; {} goals stored, nearest {:.2} from start",
        reached,
        settings.rounds,
        goals.size(),
        goals.distance(&scene.start())
    );
    Ok(())
}

/// Draw `rounds` goals, reward the reachable ones and penalize the rest.
fn plan(region: &GoalRegion<Arc<BoxScene>>, scene: &BoxScene, rounds: usize) -> Result<usize> {
    let goals = region.goals();
    let start = scene.start();
    let mut reached = 0;
    let mut round = 0;

    while round < rounds {
        let goal = match goals.sample_weighted() {
            Ok(goal) => goal,
            Err(RegionError::EmptyRegion) if region.could_sample() => {
                thread::sleep(Duration::from_millis(5));
                continue;
            }
            Err(e) => return Err(e).context("No goals available"),
        };
        round += 1;

        if scene.segment_clear(start, goal.state) {
            let weight = goals.reward(goal.handle)?;
            reached += 1;
            info!("Round {}: reached {} (weight {:.3})", round, goal.state, weight);
        } else {
            let weight = goals.penalize(goal.handle)?;
            info!("Round {}: blocked {} (weight {:.3})", round, goal.state, weight);
        }
    }

    Ok(reached)
}
