use serde::{Deserialize, Serialize};

/// Easing curve named on a transition. The renderer evaluates it; the engine
/// only carries the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "linear" => Some(Easing::Linear),
            "ease_in" => Some(Easing::EaseIn),
            "ease_out" => Some(Easing::EaseOut),
            "ease_in_out" => Some(Easing::EaseInOut),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
        }
    }
}

pub const DEFAULT_DIRECTION: &str = "left_to_right";
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.5;

/// Defines the visual effect used to move from one scene to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionType {
    /// Fade through black.
    Fade,
    /// Crossfade between the two scenes.
    Dissolve,
    Wipe { direction: String },
    Slide { direction: String },
    Zoom { zoom_factor: f64 },
    Pan { direction: String },
}

impl TransitionType {
    /// Resolve a `transition_type` tag with its default parameters. Unknown
    /// tags fall back to a fade.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "dissolve" => TransitionType::Dissolve,
            "wipe" => TransitionType::Wipe {
                direction: DEFAULT_DIRECTION.to_string(),
            },
            "slide" => TransitionType::Slide {
                direction: DEFAULT_DIRECTION.to_string(),
            },
            "zoom" => TransitionType::Zoom {
                zoom_factor: DEFAULT_ZOOM_FACTOR,
            },
            "pan" => TransitionType::Pan {
                direction: DEFAULT_DIRECTION.to_string(),
            },
            _ => TransitionType::Fade,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransitionType::Fade => "fade",
            TransitionType::Dissolve => "dissolve",
            TransitionType::Wipe { .. } => "wipe",
            TransitionType::Slide { .. } => "slide",
            TransitionType::Zoom { .. } => "zoom",
            TransitionType::Pan { .. } => "pan",
        }
    }

    pub fn default_duration(&self) -> f64 {
        match self {
            TransitionType::Dissolve => 1.5,
            _ => 1.0,
        }
    }

    pub fn default_easing(&self) -> Easing {
        match self {
            TransitionType::Fade | TransitionType::Wipe { .. } => Easing::Linear,
            TransitionType::Dissolve
            | TransitionType::Slide { .. }
            | TransitionType::Zoom { .. }
            | TransitionType::Pan { .. } => Easing::EaseInOut,
        }
    }

    /// Replace the direction of directional effects; others are unchanged.
    pub fn set_direction(&mut self, new_direction: &str) {
        match self {
            TransitionType::Wipe { direction }
            | TransitionType::Slide { direction }
            | TransitionType::Pan { direction } => *direction = new_direction.to_string(),
            TransitionType::Fade | TransitionType::Dissolve | TransitionType::Zoom { .. } => {}
        }
    }
}

/// A scene transition definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// The type of transition effect.
    pub effect: TransitionType,
    /// Duration in seconds.
    pub duration: f64,
    pub easing: Easing,
}

impl Transition {
    /// The transition named by `tag`, with that type's default duration and easing.
    pub fn for_tag(tag: &str) -> Self {
        let effect = TransitionType::from_tag(tag);
        Self {
            duration: effect.default_duration(),
            easing: effect.default_easing(),
            effect,
        }
    }
}
