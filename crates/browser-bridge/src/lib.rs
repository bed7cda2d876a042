//! Browser session contract for the formpilot engine.
//!
//! The engine never talks to a real browser directly; it consumes the
//! narrow [`BrowserSession`] trait defined here. Session lifecycle,
//! fingerprinting and navigation are the host's concern. The crate also
//! ships [`FixturePage`], an in-memory control tree implementing the same
//! trait, which every test in the workspace builds its pages from.

pub mod errors;
pub mod fixture;
pub mod session;

pub use errors::{Result, SessionError};
pub use fixture::{ControlSpec, FixturePage, FixturePageBuilder};
pub use session::{AppliedAction, BoundingBox, BrowserSession, ContainerIdiom, Query};
