//! Path service protocol.
//!
//! The agent never computes routes itself. It fires a [`PathRequest`] at the
//! external path service and later receives a [`PathReply`]. Requests carry
//! no correlation id, so whichever reply arrives last wins.

use serde::{Deserialize, Serialize};

use crate::collaborators::InstanceId;
use crate::math::Vec3;

/// A route request sent to the path service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    /// Agent asking for the route.
    pub requester: InstanceId,
    /// Route start (the agent's estimated position).
    pub from: Vec3,
    /// Route goal.
    pub goal: Vec3,
}

/// A reply from the path service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathReply {
    /// The service found no route.
    NoPath,
    /// Ordered waypoints from near the agent to the goal.
    Waypoints(Vec<Vec3>),
}

impl PathReply {
    /// False if any waypoint has a non-finite coordinate.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::NoPath => true,
            Self::Waypoints(points) => points.iter().all(|p| p.is_finite()),
        }
    }

    /// Convert into a usable path. Empty waypoint lists count as no path.
    #[must_use]
    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::NoPath => None,
            Self::Waypoints(points) => Path::new(points),
        }
    }
}

/// A non-empty ordered list of waypoints.
///
/// Paths are refreshed wholesale rather than consumed by index: the agent
/// always steers along waypoint 0 → waypoint 1 of the latest reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Vec3>,
}

impl Path {
    /// Build a path; `None` if `waypoints` is empty or contains non-finite
    /// coordinates.
    #[must_use]
    pub fn new(waypoints: Vec<Vec3>) -> Option<Self> {
        if waypoints.is_empty() || waypoints.iter().any(|p| !p.is_finite()) {
            return None;
        }
        Some(Self { waypoints })
    }

    /// Waypoint the agent is at or leaving.
    #[must_use]
    pub fn current(&self) -> Vec3 {
        self.waypoints[0]
    }

    /// The waypoint after [`current`](Self::current), if any.
    #[must_use]
    pub fn next(&self) -> Option<Vec3> {
        self.waypoints.get(1).copied()
    }

    /// Point to steer toward this tick.
    #[must_use]
    pub fn steering_target(&self) -> Vec3 {
        self.next().unwrap_or_else(|| self.current())
    }

    /// All waypoints.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }
}
