#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Garden Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable views, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Garden Defence.";

/// Lives granted to the player when a new world is created.
pub const STARTING_LIVES: u32 = 7;

/// Money granted to the player when a new world is created.
pub const STARTING_MONEY: u32 = 200;

/// Width of the logical frame, including the menu panel.
pub const FRAME_WIDTH: i32 = 800;

/// Height of the logical frame.
pub const FRAME_HEIGHT: i32 = 600;

/// Playable garden region where towers may be placed.
pub const PLAY_AREA: ScreenRect = ScreenRect::new(0, 0, 600, 600);

/// Menu panel drawn to the right of the garden.
pub const MENU_PANEL: ScreenRect = ScreenRect::new(600, 0, 800, 600);

/// Menu button that arms tower placement.
pub const TOWER_BUTTON: ScreenRect = ScreenRect::new(660, 260, 740, 340);

/// Minimum clearance between a tower and the path, exclusive.
pub const PATH_CLEARANCE: f64 = 40.0;

/// Integer pixel position used for every entity in the garden.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Creates a new coordinate from pixel components.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal pixel component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical pixel component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate translated by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance between two coordinates.
    ///
    /// Computed in 64-bit integers so range checks stay exact.
    #[must_use]
    pub fn distance_squared(self, other: Coordinate) -> i64 {
        let dx = i64::from(other.x) - i64::from(self.x);
        let dy = i64::from(other.y) - i64::from(self.y);
        dx * dx + dy * dy
    }

    /// Reports whether `other` lies within `radius` of this coordinate, inclusive.
    #[must_use]
    pub fn is_within(self, other: Coordinate, radius: u32) -> bool {
        let radius = i64::from(radius);
        self.distance_squared(other) <= radius * radius
    }
}

/// Axis-aligned rectangle in frame pixels whose bounds are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenRect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl ScreenRect {
    /// Creates a rectangle from its edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.left
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.top
    }

    /// Right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.right
    }

    /// Bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Reports whether the point lies strictly inside the rectangle.
    ///
    /// Points on an edge are outside, matching the placement rules.
    #[must_use]
    pub const fn contains(&self, point: Coordinate) -> bool {
        point.x > self.left && point.x < self.right && point.y > self.top && point.y < self.bottom
    }
}

/// Whether the simulation still accepts gameplay mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// Enemies advance, towers fire, and the player may build.
    Running,
    /// Lives ran out; the world ignores further gameplay commands.
    GameOver,
}

/// Phases of the frame state machine that drives the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// One-time initialisation before the first frame.
    Setup,
    /// Advances the simulation by the wall-clock delta.
    Update,
    /// Publishes the current state for presentation.
    Draw,
    /// Paces the loop between frames.
    Wait,
    /// Terminal phase; the loop exits.
    End,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock, moving enemies and tower cooldowns.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy enter the path at its start.
    SpawnEnemy {
        /// Variant of enemy to create.
        kind: EnemyKind,
    },
    /// Requests placement of a tower at the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Centre of the tower in frame pixels.
        position: Coordinate,
    },
    /// Requests that a tower launch its effect toward a target point.
    FireEffect {
        /// Tower that fires.
        tower: TowerId,
        /// Point the effect travels toward.
        target: Coordinate,
    },
    /// Moves live effects, resolves their hits and reaps expired ones.
    AdvanceEffects {
        /// Duration of simulated time applied to every effect.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy walked off the end of the path.
    EnemyReachedEnd {
        /// Identifier of the enemy that escaped.
        enemy: EnemyId,
        /// Variant of the enemy.
        kind: EnemyKind,
        /// Lives actually deducted, after saturation at zero.
        lives_lost: u32,
    },
    /// Reports that an effect destroyed an enemy.
    EnemyDestroyed {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Variant of the destroyed enemy.
        kind: EnemyKind,
        /// Effect responsible for the kill.
        effect: EffectId,
        /// Money credited for the kill.
        reward: u32,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Centre of the tower.
        position: Coordinate,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Position provided in the placement request.
        position: Coordinate,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower launched an effect.
    EffectSpawned {
        /// Identifier assigned to the effect.
        effect: EffectId,
        /// Variant of the effect.
        kind: EffectKind,
        /// Tower that fired.
        tower: TowerId,
        /// Point the effect travels toward.
        target: Coordinate,
    },
    /// Reports that an effect outlived its duration and was removed.
    EffectExpired {
        /// Identifier of the expired effect.
        effect: EffectId,
    },
    /// Announces that the player ran out of lives.
    GameOver,
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }

            /// Returns the identifier that follows this one.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to an enemy, increasing in spawn order.
    EnemyId
);

identifier!(
    /// Unique identifier assigned to a tower.
    TowerId
);

identifier!(
    /// Unique identifier assigned to an effect.
    EffectId
);

/// Enemies that walk the garden path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Slow garden snail.
    Snail,
    /// Armoured escargot cargo van.
    SCargo,
}

impl EnemyKind {
    /// Travel speed along the path in pixels per second.
    #[must_use]
    pub const fn speed(self) -> f64 {
        match self {
            Self::Snail => 72.0,
            Self::SCargo => 100.0,
        }
    }

    /// Lives deducted when the enemy reaches the end of the path.
    #[must_use]
    pub const fn life_cost(self) -> u32 {
        match self {
            Self::Snail => 1,
            Self::SCargo => 5,
        }
    }
}

/// Types of towers that can be constructed in the garden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Salt shaker that throws salt crystals.
    Salt,
}

impl TowerKind {
    /// Money required to place the tower.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Salt => 120,
        }
    }

    /// Radius, in pixels, within which the tower notices enemies.
    #[must_use]
    pub const fn range(self) -> u32 {
        match self {
            Self::Salt => 100,
        }
    }

    /// Number of ticks that must pass after firing before the tower fires again.
    ///
    /// The tower is ready once strictly more ticks than this have elapsed.
    #[must_use]
    pub const fn cooldown_ticks(self) -> u32 {
        match self {
            Self::Salt => 100,
        }
    }

    /// Tick counter assigned to freshly placed towers so they can fire at once.
    #[must_use]
    pub const fn initial_ticks_since_fired(self) -> u32 {
        self.cooldown_ticks() + 1
    }

    /// Reports whether a tower with the provided counter may fire.
    #[must_use]
    pub const fn is_ready(self, ticks_since_fired: u32) -> bool {
        ticks_since_fired > self.cooldown_ticks()
    }

    /// Offset applied to the target enemy's position when aiming.
    #[must_use]
    pub const fn aim_offset(self) -> (i32, i32) {
        match self {
            Self::Salt => (-100, -100),
        }
    }

    /// Effect launched when the tower fires.
    #[must_use]
    pub const fn effect(self) -> EffectKind {
        match self {
            Self::Salt => EffectKind::SaltCrystal,
        }
    }
}

/// Transient actions spawned by towers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Cluster of salt crystals flying toward a captured point.
    SaltCrystal,
}

impl EffectKind {
    /// Simulated time after which the effect removes itself.
    #[must_use]
    pub const fn lifetime(self) -> Duration {
        match self {
            Self::SaltCrystal => Duration::from_millis(1_500),
        }
    }

    /// Radius, in pixels, within which the effect destroys enemies.
    #[must_use]
    pub const fn hit_radius(self) -> u32 {
        match self {
            Self::SaltCrystal => 40,
        }
    }

    /// Money credited for every enemy the effect destroys.
    #[must_use]
    pub const fn reward(self) -> u32 {
        match self {
            Self::SaltCrystal => 10,
        }
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The game ended, so building is disabled.
    GameOver,
    /// The requested position lies outside the garden.
    OutOfBounds,
    /// The requested position is within the path clearance.
    TooCloseToPath,
    /// The player cannot afford the tower.
    InsufficientFunds,
}

/// Declarative placement preview describing a potential tower construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Position the tower would occupy.
    pub position: Coordinate,
    /// Reason the world would reject the placement, if any.
    pub rejection: Option<PlacementError>,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(
        kind: TowerKind,
        position: Coordinate,
        rejection: Option<PlacementError>,
    ) -> Self {
        Self {
            kind,
            position,
            rejection,
        }
    }

    /// Indicates whether the preview represents a valid placement location.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Variant of the enemy.
    pub kind: EnemyKind,
    /// Current position on the path.
    pub position: Coordinate,
}

/// Read-only snapshot describing all enemies on the path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Centre of the tower.
    pub position: Coordinate,
    /// Ticks elapsed since the tower last fired.
    pub ticks_since_fired: u32,
}

impl TowerSnapshot {
    /// Reports whether the tower's cooldown has elapsed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.kind.is_ready(self.ticks_since_fired)
    }
}

/// Read-only snapshot describing all towers placed in the garden.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Finds the snapshot for the provided tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a live effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectSnapshot {
    /// Identifier allocated to the effect.
    pub id: EffectId,
    /// Variant of the effect.
    pub kind: EffectKind,
    /// Current position of the effect.
    pub position: Coordinate,
    /// Simulated time the effect has been alive.
    pub age: Duration,
}

/// Target assignment computed for a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that selected the target.
    pub tower: TowerId,
    /// Enemy chosen as the target.
    pub enemy: EnemyId,
    /// Centre of the tower.
    pub tower_position: Coordinate,
    /// Position of the enemy when the target was chosen.
    pub enemy_position: Coordinate,
}
