//! Device selection for loaded pipelines. Resolved once at startup and
//! immutable afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::config::Config;

/// Inference device shared by every loaded pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    Cuda(usize),
}

impl Device {
    pub fn is_gpu(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(index) => write!(f, "cuda:{index}"),
        }
    }
}

/// Resolved device plus the concurrency limit derived from it.
#[derive(Clone, Copy, Debug)]
pub struct DeviceSetup {
    pub device: Device,
    pub max_inflight: usize,
}

/// Resolve the inference device. Precedence: explicit `DEVICE` >
/// `USE_GPU` > auto-detect from the runtime's reported GPU availability.
/// On GPU the default inflight limit is 1 to avoid VRAM contention; on
/// CPU it is the backend worker count.
pub fn resolve_device(config: &Config, gpu_available: bool) -> DeviceSetup {
    let device = resolve_kind(config, gpu_available);

    let max_inflight = match config.max_inflight_translations {
        Some(value) => value.max(1),
        None => match device {
            Device::Cuda(_) => 1,
            Device::Cpu => config.max_workers_backend.max(1),
        },
    };

    info!(%device, max_inflight, "device resolved");
    DeviceSetup {
        device,
        max_inflight,
    }
}

fn resolve_kind(config: &Config, gpu_available: bool) -> Device {
    let requested = config.device_env.trim().to_lowercase();
    if !requested.is_empty() && requested != "auto" {
        if let Some(rest) = requested.strip_prefix("cuda") {
            if !gpu_available {
                warn!("DEVICE={requested} requested but no GPU available, using CPU");
                return Device::Cpu;
            }
            let index = rest
                .strip_prefix(':')
                .and_then(|value| value.parse().ok())
                .unwrap_or(0);
            return Device::Cuda(index);
        }
        return Device::Cpu;
    }

    match config.use_gpu.as_str() {
        "1" | "true" | "yes" => {
            if gpu_available {
                Device::Cuda(0)
            } else {
                warn!("USE_GPU requested but no GPU available, using CPU");
                Device::Cpu
            }
        }
        "0" | "false" | "no" => Device::Cpu,
        _ => {
            if gpu_available {
                Device::Cuda(0)
            } else {
                Device::Cpu
            }
        }
    }
}
