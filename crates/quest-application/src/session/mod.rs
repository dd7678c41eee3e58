mod gate;

pub use gate::{AuthStatus, Route, RouteDecision, SessionGate};
