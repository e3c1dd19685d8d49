//! Terminal presentation for the home and chat screens.
//!
//! [`palette`] maps the stored color scheme to terminal colors, [`home`]
//! prints the welcome screen, and [`chat`] runs the interactive loop on top
//! of [`crate::core::session`].

pub mod chat;
pub mod home;
pub mod palette;
