use std::{path::Path, sync::Arc};

use anyhow::Result;
use clap::Parser;
use moasnap_api::{HttpSnapApi, SnapApi};
use moasnap_camera::{
    ffmpeg::FfmpegDevice, probe_cameras, CameraDevice, CaptureSessionManager, PatternDevice,
};
use moasnap_media::{encode_snap, persist_capture, render_square};
use moasnap_ops::{init_tracing, UploadHistory};
use moasnap_types::{
    camera::FacingMode,
    config::{ApiConfig, CameraConfig, MoasnapConfig, OpsConfig},
    frame::DisplayGeometry,
    mission::MissionContext,
    participant::ParticipantProfile,
};
use moasnap_uploader::{bind_view, Navigator, ProfileSink, UploadCoordinator};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "moasnap", about = "Meeting snap capture and upload pipeline")]
struct Args {
    #[arg(long, default_value = "configs/dev.toml")]
    config: String,
    /// List candidate camera device nodes and exit.
    #[arg(long)]
    probe_cameras: bool,
    /// Use the synthetic pattern device instead of real hardware.
    #[arg(long)]
    synthetic: bool,
    #[arg(long)]
    meeting_id: Option<u64>,
    #[arg(long, conflicts_with = "mission_id")]
    random_mission_id: Option<u64>,
    #[arg(long)]
    mission_id: Option<u64>,
    /// Start with the front (user-facing) camera.
    #[arg(long)]
    front: bool,
    /// Flip the facing mode once before capturing.
    #[arg(long)]
    toggle_facing: bool,
    #[arg(long, default_value_t = 1080.0)]
    display_width: f64,
    #[arg(long, default_value_t = 1080.0)]
    display_height: f64,
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

impl Args {
    fn mission_context(&self) -> MissionContext {
        if let Some(mission_id) = self.random_mission_id {
            MissionContext::Random { mission_id }
        } else if let Some(mission_id) = self.mission_id {
            MissionContext::Select { mission_id }
        } else {
            MissionContext::None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.probe_cameras {
        println!("{}", serde_json::to_string_pretty(&probe_cameras())?);
        return Ok(());
    }

    let config = load_config(&args.config);
    init_tracing(&config.ops)?;

    if args.synthetic {
        run_pipeline(PatternDevice::new(1080, 1080), &config, &args).await
    } else {
        run_pipeline(FfmpegDevice::new(&config.camera), &config, &args).await
    }
}

async fn run_pipeline<D: CameraDevice>(
    device: D,
    config: &MoasnapConfig,
    args: &Args,
) -> Result<()> {
    let history = UploadHistory::new();
    let coordinator = UploadCoordinator::new(HttpSnapApi::new(&config.api), history.clone());

    let mut manager = CaptureSessionManager::new(device);
    let facing = if args.front {
        FacingMode::Front
    } else {
        FacingMode::Rear
    };
    manager.open_session(facing).await?;

    let preview = manager.pump_preview().await?;
    info!("라이브 프레임 {}x{}", preview.width, preview.height);

    if args.toggle_facing {
        try_toggle(&mut manager, &coordinator).await?;
    }

    let frame = manager.read_frame().await?;
    // The capture is done; release the camera before the long upload await.
    manager.close_session().await;

    let display = DisplayGeometry::new(args.display_width, args.display_height, args.pixel_ratio);
    let square = render_square(&frame, &display, manager.facing())?;
    if let Some(dir) = &config.camera.capture_dir {
        persist_capture(&square, Path::new(dir))?;
    }
    let image = encode_snap(&square)?;

    let (guard, view) = bind_view(Arc::new(UserStateLog), Arc::new(RouteLog));
    let response = coordinator
        .submit(&image, args.mission_context(), args.meeting_id, None, &view)
        .await?;
    info!(
        "스냅 업로드 완료: snap_id={:?} url={:?}",
        response.snap_id, response.snap_url
    );
    guard.detach();

    for record in history.snapshot().await {
        info!(
            attempt = %record.attempt_id,
            "attempt outcome: {:?}",
            record.outcome
        );
    }
    Ok(())
}

/// Facing toggles are declined while an upload is in flight.
async fn try_toggle<D: CameraDevice, A: SnapApi>(
    manager: &mut CaptureSessionManager<D>,
    coordinator: &UploadCoordinator<A>,
) -> Result<()> {
    if coordinator.state().is_pending() {
        warn!("업로드가 진행 중이라 카메라 전환을 건너뜁니다");
        return Ok(());
    }
    manager.toggle_facing().await?;
    Ok(())
}

struct UserStateLog;

impl ProfileSink for UserStateLog {
    fn apply(&self, profile: &ParticipantProfile) {
        info!(
            "참여자 상태 반영: id={} nickname={} role={:?} shoot_count={}",
            profile.participant_id, profile.nickname, profile.role, profile.shoot_count
        );
    }
}

struct RouteLog;

impl Navigator for RouteLog {
    fn go_meeting_home(&self) {
        info!("meeting-home 으로 이동");
    }
}

fn load_config(path: &str) -> MoasnapConfig {
    match MoasnapConfig::from_file(path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!("Invalid config in '{path}': {err}. Falling back to internal defaults.");
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!("Failed to load config from '{path}': {err}. Falling back to internal defaults.");
            default_config()
        }
    }
}

fn default_config() -> MoasnapConfig {
    let config = MoasnapConfig {
        camera: CameraConfig {
            rear_device: "/dev/video0".into(),
            front_device: "/dev/video1".into(),
            input_format: "mjpeg".into(),
            capture_dir: None,
        },
        api: ApiConfig {
            base_url: "http://localhost:8080".into(),
            auth_token: None,
        },
        ops: OpsConfig {
            log_level: "info".into(),
        },
    };
    debug_assert!(config.validate().is_ok());
    config
}
