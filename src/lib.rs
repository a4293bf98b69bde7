//! Scene transitions with a loading overlay for Bevy apps.
//!
//! Add [`loader::plugin`], insert a [`SceneLoader`] wrapping your
//! [`SceneHost`], then trigger [`RequestSceneLoad`] to switch scenes.

pub mod loader;
pub mod simulated;
pub mod theme;

pub use loader::{
    LoadFault, LoaderConfig, LoadingView, PauseCount, RequestSceneLoad, RestoreFlag, SceneHost,
    SceneLoadFinished, SceneLoader, Stage,
};
pub use simulated::SimulatedHost;
