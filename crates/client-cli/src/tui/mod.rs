//! Chat screen: conversation list on the left, open transcript and composer
//! on the right. Renders from view-models built out of the controller state.

mod app;

pub use app::ChatScreen;
