#![doc = "Timer-dispatch core for the virtual MCU."]
//!
//! On every hardware timer interrupt the [`Dispatcher`] decides whether to
//! run the due software timer immediately, keep polling briefly, or yield
//! back to cooperative tasks. The [`IdleBooster`] widens the eager-dispatch
//! window while the system idles and parks the processor until the next
//! interrupt. Hardware is reached only through the traits in [`hal`].

pub mod dispatch;
pub mod guard;
pub mod hal;
pub mod idle;
pub mod sim;

pub use dispatch::*;
pub use guard::*;
pub use hal::*;
pub use idle::*;
