// VitalWatch - Detection Core
//
// Leaf-first: conditioner -> rms / debounce -> classifier -> cooldown.

pub mod classifier;
pub mod conditioner;
pub mod cooldown;
pub mod debounce;
pub mod rms;

pub use classifier::{compose_message, Classification, Classifier, ClassifierInput};
pub use conditioner::{SensorHealth, SignalConditioner};
pub use cooldown::AlertCooldown;
pub use debounce::{
    BouncePolicy, DebounceTimer, DetectorPhase, DetectorSettings, EventDetector, FlagTransition,
    SustainedMotion,
};
pub use rms::RmsWindow;
