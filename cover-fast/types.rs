use cover_core::{Image, Keypoint};

/// Keypoint with corner response score for NMS and ranking.
///
/// The keypoint is expressed in the coordinates of its own pyramid level.
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

/// Detection output for one pyramid level
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub scale: ScaleLevel,
    pub image: Image,
    pub keypoints: Vec<ScoredKeypoint>,
}

impl PyramidLevel {
    /// Maps a level-local coordinate back onto the base image
    pub fn to_base(&self, kp: &Keypoint) -> Keypoint {
        Keypoint {
            x: kp.x * self.scale.scale,
            y: kp.y * self.scale.scale,
            angle: kp.angle,
        }
    }
}

/// Corner type classification from the segment test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
