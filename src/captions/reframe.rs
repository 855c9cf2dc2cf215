//! Geometry for turning a landscape (or any) frame into the vertical target.

use crate::config::ReframeMode;
use crate::error::{CorteError, Result};

/// A centred crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// How a source frame maps onto the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReframePlan {
    pub mode: ReframeMode,
    pub source: (u32, u32),
    pub target: (u32, u32),
    /// Only set for [`ReframeMode::Crop`].
    pub crop: Option<Crop>,
}

impl ReframePlan {
    /// Compute the plan for a source resolution. Pure; no probing.
    pub fn new(source: (u32, u32), target: (u32, u32), mode: ReframeMode) -> Result<Self> {
        let (sw, sh) = source;
        let (tw, th) = target;

        if tw == 0 || th == 0 || tw % 2 != 0 || th % 2 != 0 {
            return Err(CorteError::Config(format!(
                "Caption target size {}x{} must be non-zero and even",
                tw, th
            )));
        }
        if sw == 0 || sh == 0 {
            return Err(CorteError::TranscodeFailed(format!(
                "Source has an invalid frame size {}x{}",
                sw, sh
            )));
        }

        let crop = match mode {
            ReframeMode::Pad => None,
            ReframeMode::Crop => Some(centre_crop(source, target)?),
        };

        Ok(Self {
            mode,
            source,
            target,
            crop,
        })
    }

    /// ffmpeg filter chain producing a `target`-sized frame.
    pub fn filter(&self) -> String {
        let (tw, th) = self.target;
        match self.crop {
            Some(c) => format!(
                "crop={}:{}:{}:{},scale={}:{},setsar=1",
                c.width, c.height, c.x, c.y, tw, th
            ),
            None => format!(
                "scale={tw}:{th}:force_original_aspect_ratio=decrease,\
                 pad={tw}:{th}:(ow-iw)/2:(oh-ih)/2:black,setsar=1"
            ),
        }
    }
}

fn centre_crop((sw, sh): (u32, u32), (tw, th): (u32, u32)) -> Result<Crop> {
    let (sw64, sh64, tw64, th64) = (sw as u64, sh as u64, tw as u64, th as u64);

    // Wider than the target: keep full height, narrow the width
    let (width, height) = if sw64 * th64 > sh64 * tw64 {
        (even(sh64 * tw64 / th64), even(sh64))
    } else {
        (even(sw64), even(sw64 * th64 / tw64))
    };

    if width == 0 || height == 0 {
        return Err(CorteError::TranscodeFailed(format!(
            "Source frame {}x{} is too small to crop to {}x{}",
            sw, sh, tw, th
        )));
    }

    Ok(Crop {
        width,
        height,
        x: (sw - width) / 2,
        y: (sh - height) / 2,
    })
}

fn even(v: u64) -> u32 {
    (v - v % 2) as u32
}
