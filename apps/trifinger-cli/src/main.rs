use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sim_backend::MockPhysics;
use std::path::PathBuf;
use tracing::info;

use trifinger_sim::assets::resolve_asset_root;
use trifinger_sim::mock::mock_backend;
use trifinger_sim::platform::initial_robot_position;
use trifinger_sim::{
    check_finger_type, get_valid_finger_types, load_config_file, Action, ActionLog, ObjectPose,
    PlatformConfig, Pose, TriFingerPlatform,
};

#[derive(Parser, Debug)]
#[command(
    name = "trifinger",
    version,
    about = "Simulated TriFinger platform",
    disable_help_subcommand = true
)]
struct Cli {
    /// Platform config (YAML); defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Controller {
    /// Constant torque on every joint
    Torque,
    /// Hold the initial joint positions
    Hold,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List supported finger types
    FingerTypes,
    /// Check a finger type name and print its joint topology
    FingerInfo {
        /// Finger type name (deprecated aliases accepted)
        name: String,
    },
    /// Run an episode on the mock backend and store the action log
    Run {
        /// Number of control steps
        #[arg(long, default_value_t = 1000u64)]
        steps: u64,
        /// Controller generating the actions
        #[arg(long, value_enum, default_value_t = Controller::Hold)]
        controller: Controller,
        /// Torque (Nm) for the torque controller
        #[arg(long, default_value_t = 0.05)]
        torque: f64,
        /// Render camera observations
        #[arg(long, action = ArgAction::SetTrue)]
        cameras: bool,
        /// Seed for the initial object pose
        #[arg(long)]
        seed: Option<u64>,
        /// Output action log path
        #[arg(long, default_value = "action_log.json")]
        log: PathBuf,
        /// Print the episode summary as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Re-run the actions of a stored log and compare the final object pose
    Replay {
        /// Action log to replay
        #[arg(long)]
        log: PathBuf,
    },
    /// Validate a config file and print the effective settings
    CheckConfig,
}

#[derive(Debug, Serialize)]
struct EpisodeSummary {
    steps: u64,
    last_t: Option<u64>,
    camera_frames: u64,
    final_object_pose: Pose,
    final_joint_position: Vec<f64>,
    log: PathBuf,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => PlatformConfig::default(),
    };

    match cli.command {
        Commands::FingerTypes => finger_types(),
        Commands::FingerInfo { name } => finger_info(&name),
        Commands::Run {
            steps,
            controller,
            torque,
            cameras,
            seed,
            log,
            json,
        } => {
            let mut config = config;
            config.enable_cameras |= cameras;
            run_episode(config, steps, controller, torque, seed, log, json)
        }
        Commands::Replay { log } => replay(config, log),
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn finger_types() -> Result<()> {
    for name in get_valid_finger_types() {
        let finger_type = check_finger_type(name)?.finger_type;
        println!(
            "{}\tfingers={}\tjoints={}\turdf={}",
            name,
            finger_type.number_of_fingers(),
            finger_type.number_of_joints(),
            finger_type.urdf_file()
        );
    }
    Ok(())
}

fn finger_info(name: &str) -> Result<()> {
    let check = check_finger_type(name).with_context(|| format!("finger type: {name}"))?;
    if let Some(alias) = check.deprecated_alias {
        println!("'{alias}' is deprecated, using '{}'", check.finger_type);
    }
    let topology = check.finger_type.topology();
    println!("links: {}", topology.link_names.join(", "));
    println!("tips:  {}", topology.tip_link_names.join(", "));
    Ok(())
}

fn build_platform(
    config: PlatformConfig,
    seed: Option<u64>,
) -> Result<TriFingerPlatform<MockPhysics>> {
    let assets = resolve_asset_root(config.asset_root.as_deref());
    let backend = mock_backend(&assets);
    let platform = match seed {
        Some(seed) => {
            TriFingerPlatform::with_rng(backend, config, &mut StdRng::seed_from_u64(seed))
        }
        None => TriFingerPlatform::new(backend, config),
    };
    platform.context("creating platform")
}

fn run_episode(
    config: PlatformConfig,
    steps: u64,
    controller: Controller,
    torque: f64,
    seed: Option<u64>,
    log: PathBuf,
    json: bool,
) -> Result<()> {
    let mut platform = build_platform(config, seed)?;
    let n = platform.number_of_joints();
    let action = match controller {
        Controller::Torque => Action::torque(vec![torque; n]),
        Controller::Hold => Action::position(initial_robot_position()),
    };

    let mut last_t = None;
    let mut camera_frames = 0u64;
    for _ in 0..steps {
        let t = platform.append_desired_action(&action)?;
        if platform.cameras_enabled() {
            let observation = platform.get_camera_observation(t)?;
            camera_frames += observation
                .cameras
                .iter()
                .filter(|c| c.image.is_some())
                .count() as u64;
        }
        last_t = Some(t);
    }

    let (final_pose, final_joints) = match last_t {
        Some(t) => (
            platform.get_object_pose(t + 1)?,
            platform.get_robot_observation(t + 1)?.position,
        ),
        None => (ObjectPose::default(), initial_robot_position()),
    };
    platform
        .store_action_log(&log)
        .with_context(|| format!("storing action log: {}", log.display()))?;
    info!(steps, path = %log.display(), "episode finished");

    let summary = EpisodeSummary {
        steps,
        last_t,
        camera_frames,
        final_object_pose: Pose::from(&final_pose),
        final_joint_position: final_joints,
        log,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("steps: {}", summary.steps);
        println!("camera frames: {}", summary.camera_frames);
        println!("object position: {:?}", summary.final_object_pose.position);
        println!("joint position: {:?}", summary.final_joint_position);
        println!("log: {}", summary.log.display());
    }
    Ok(())
}

fn replay(config: PlatformConfig, path: PathBuf) -> Result<()> {
    let log = ActionLog::load(&path)
        .with_context(|| format!("loading action log: {}", path.display()))?;
    let config = PlatformConfig {
        initial_object_pose: Some(log.initial_object_pose),
        ..config
    };
    let mut platform = build_platform(config, None)?;
    for record in &log.actions {
        let t = platform.append_desired_action(&record.to_action())?;
        anyhow::ensure!(
            t == record.t,
            "time index mismatch: replayed {t}, logged {}",
            record.t
        );
    }
    let replayed = match platform.get_current_timeindex() {
        Some(t) => platform.get_object_pose(t)?,
        None => ObjectPose::default(),
    };
    println!("replayed {} actions", log.actions.len());
    match log.final_object_pose {
        Some(logged) => {
            let error = logged
                .position
                .iter()
                .zip(&replayed.position)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            println!("final object position error: {error:.6} m");
        }
        None => println!("log has no final object pose"),
    }
    Ok(())
}
