/// Process-wide GPU device
///
/// The device is requested lazily on first use and shared by every
/// offscreen render and histogram pass. When the driver reports the device lost, the context is
/// flagged and the next `acquire` replaces it wholesale with a fresh one.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

// Use wgpu from iced to avoid dependency conflicts
use iced_wgpu::wgpu;

use crate::error::GpuError;

/// Id 0 is reserved for the device owned by the iced renderer
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// An adapter's device and queue
pub struct GpuContext {
    /// Unique per device instance, used in pipeline cache keys
    pub id: u64,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
    lost: Arc<AtomicBool>,
}

// Manual Debug implementation (wgpu types don't implement Debug)
impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("id", &self.id)
            .field("adapter", &self.adapter_info.name)
            .field("lost", &self.is_lost())
            .finish_non_exhaustive()
    }
}

impl GpuContext {
    /// Request an adapter and device
    pub async fn request(power_preference: wgpu::PowerPreference) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("RAW Viewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            warn!("⚠️  GPU device lost ({:?}): {}", reason, message);
            flag.store(true, Ordering::SeqCst);
        });

        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);
        info!(
            "🖥️  GPU device #{} on {} ({:?})",
            id, adapter_info.name, adapter_info.backend
        );

        Ok(Self {
            id,
            device,
            queue,
            adapter_info,
            lost,
        })
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Fail with `DeviceLost` if the device has gone away
    pub fn ensure_alive(&self) -> Result<(), GpuError> {
        if self.is_lost() {
            Err(GpuError::DeviceLost(self.adapter_info.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Map `buffer` for reading
    ///
    /// The device is polled on a blocking thread so the async runtime keeps
    /// running while the GPU finishes.
    pub async fn map_read(self: &Arc<Self>, buffer: &wgpu::Buffer) -> Result<(), GpuError> {
        let (tx, rx) = oneshot::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let context = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            context.device.poll(wgpu::Maintain::Wait);
        })
        .await
        .map_err(|e| GpuError::Map(e.to_string()))?;

        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.ensure_alive()?;
                Err(GpuError::Map(e.to_string()))
            }
            Err(_) => Err(GpuError::Map("mapping callback was dropped".to_string())),
        }
    }
}

/// Holder for the shared device
///
/// Callers clone the `Arc` out and release the lock right away, so a pass
/// in flight keeps its own device even if the slot is refilled meanwhile.
#[derive(Debug)]
pub struct DeviceSlot {
    power_preference: wgpu::PowerPreference,
    current: Mutex<Option<Arc<GpuContext>>>,
}

impl DeviceSlot {
    pub fn new(power_preference: wgpu::PowerPreference) -> Self {
        Self {
            power_preference,
            current: Mutex::new(None),
        }
    }

    /// Return the live device, requesting a new one if none is held or the
    /// held one was lost
    pub async fn acquire(&self) -> Result<Arc<GpuContext>, GpuError> {
        let mut current = self.current.lock().await;
        if let Some(context) = current.as_ref() {
            if !context.is_lost() {
                return Ok(Arc::clone(context));
            }
            info!("♻️  Replacing lost GPU device #{}", context.id);
        }

        let context = Arc::new(GpuContext::request(self.power_preference).await?);
        *current = Some(Arc::clone(&context));
        Ok(context)
    }

    /// Whether a device has been requested yet
    #[cfg(test)]
    pub async fn is_acquired(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Drop the held device; the next `acquire` requests a new one
    #[cfg(test)]
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }
}

impl Default for DeviceSlot {
    fn default() -> Self {
        Self::new(wgpu::PowerPreference::HighPerformance)
    }
}
