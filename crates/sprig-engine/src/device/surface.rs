//! Swapchain configuration decisions, kept free of live wgpu objects so they
//! can be exercised headless.

use super::{Extent2D, GpuInit, SurfaceErrorAction};

/// Swapchain-relevant subset of [`GpuInit`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct SwapchainSettings {
    pub prefer_srgb: bool,
    pub present_mode: wgpu::PresentMode,
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub frames_in_flight: u32,
}

impl From<&GpuInit> for SwapchainSettings {
    fn from(init: &GpuInit) -> Self {
        Self {
            prefer_srgb: init.prefer_srgb,
            present_mode: init.present_mode,
            alpha_mode: init.alpha_mode,
            frames_in_flight: init.frames_in_flight,
        }
    }
}

/// sRGB targets sprites are authored against, in order of preference.
const SRGB_TARGETS: [wgpu::TextureFormat; 2] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

fn pick_format(supported: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let srgb = prefer_srgb
        .then(|| SRGB_TARGETS.into_iter().find(|f| supported.contains(f)))
        .flatten();
    srgb.or_else(|| supported.first().copied())
}

fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    match requested {
        Some(mode) if supported.contains(&mode) => mode,
        Some(mode) => {
            let fallback = supported.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto);
            log::warn!("alpha mode {mode:?} unsupported by surface, using {fallback:?}");
            fallback
        }
        None => supported.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
    }
}

/// Builds the initial swapchain configuration, or `None` when the surface
/// reports no usable format.
pub(crate) fn swapchain_config(
    caps: &wgpu::SurfaceCapabilities,
    settings: SwapchainSettings,
    size: Extent2D,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = pick_format(&caps.formats, settings.prefer_srgb)?;
    log::debug!("swapchain format {format:?} at {}x{}", size.width, size.height);
    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: settings.present_mode,
        alpha_mode: pick_alpha_mode(&caps.alpha_modes, settings.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: settings.frames_in_flight,
    })
}

/// Adopts `extent` into `config`. Returns whether the surface must be
/// reconfigured; a zero extent (minimized window) keeps the previous
/// configuration and frames are skipped until the window comes back.
pub(crate) fn adopt_extent(config: &mut wgpu::SurfaceConfiguration, extent: Extent2D) -> bool {
    if extent.width == 0 || extent.height == 0 {
        return false;
    }
    if config.width == extent.width && config.height == extent.height {
        return false;
    }
    config.width = extent.width;
    config.height = extent.height;
    true
}

/// What a failed acquire means for the frame in progress.
pub(crate) fn classify(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
