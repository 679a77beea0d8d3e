//! Clock backend implementations
//!
//! - `NativeClock`: reads the hardware cycle counter and asks the OS for the
//!   current processor
//! - `MockClock`: for testing, processor and time are set by the test
//!
//! ## Choosing a Backend
//!
//! - **Tests**: Use `MockClock`
//! - **Instrumented programs**: Use `NativeClock`

mod mock;
mod native;

pub use mock::MockClock;
pub use native::NativeClock;
