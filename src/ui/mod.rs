//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that turns key presses into actions
//!   and drives streaming via [`crate::core::chat_stream`].
//! - [`renderer`] and [`welcome`]: frame composition.
//! - [`markdown`]: turns transcript turns into styled lines.
//! - [`theme`]: color and style policy.
//!
//! This layer presents and captures interaction state, while [`crate::core`]
//! owns the transcript and provider coordination.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;
pub mod welcome;
