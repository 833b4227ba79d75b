//! Type definitions for `mine_core`.
//!
//! All public types, structs, enums, and ID newtypes used by the simulation.
//! Everything here is plain serializable data: no handles, no shared references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(MinerId);
string_id!(OreId);
string_id!(EnergySourceId);
string_id!(MineId);
string_id!(UpgradeId);
string_id!(RailId);
string_id!(CommandId);
string_id!(EventId);

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in percentage coordinates (0–100 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A cell on the mine's tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OreKind {
    Coal,
    Iron,
    Copper,
    Gold,
    Crystal,
    Gem,
    Legendary,
    Tin,
    Silver,
    Mithril,
    Thorium,
    Platinum,
    Orichalcum,
    Uranium,
}

impl OreKind {
    /// Catalog order. Weighted draws walk the kinds in this order.
    pub const ALL: [OreKind; 14] = [
        OreKind::Coal,
        OreKind::Iron,
        OreKind::Copper,
        OreKind::Gold,
        OreKind::Crystal,
        OreKind::Gem,
        OreKind::Legendary,
        OreKind::Tin,
        OreKind::Silver,
        OreKind::Mithril,
        OreKind::Thorium,
        OreKind::Platinum,
        OreKind::Orichalcum,
        OreKind::Uranium,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OreKind::Coal => "coal",
            OreKind::Iron => "iron",
            OreKind::Copper => "copper",
            OreKind::Gold => "gold",
            OreKind::Crystal => "crystal",
            OreKind::Gem => "gem",
            OreKind::Legendary => "legendary",
            OreKind::Tin => "tin",
            OreKind::Silver => "silver",
            OreKind::Mithril => "mithril",
            OreKind::Thorium => "thorium",
            OreKind::Platinum => "platinum",
            OreKind::Orichalcum => "orichalcum",
            OreKind::Uranium => "uranium",
        }
    }
}

impl std::fmt::Display for OreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinerKind {
    Basic,
    Expert,
    Hauler,
    Prospector,
    Engineer,
}

impl MinerKind {
    pub const ALL: [MinerKind; 5] = [
        MinerKind::Basic,
        MinerKind::Expert,
        MinerKind::Hauler,
        MinerKind::Prospector,
        MinerKind::Engineer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MinerKind::Basic => "basic",
            MinerKind::Expert => "expert",
            MinerKind::Hauler => "hauler",
            MinerKind::Prospector => "prospector",
            MinerKind::Engineer => "engineer",
        }
    }
}

impl std::fmt::Display for MinerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Behavioral state of a miner. See `behavior` for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinerState {
    #[default]
    Seeking,
    Moving,
    Mining,
    Returning,
    Resting,
}

impl MinerState {
    pub fn label(self) -> &'static str {
        match self {
            MinerState::Seeking => "seeking",
            MinerState::Moving => "moving",
            MinerState::Mining => "mining",
            MinerState::Returning => "returning",
            MinerState::Resting => "resting",
        }
    }

    /// States in which a miner holds a claim on its target ore.
    pub fn holds_claim(self) -> bool {
        matches!(self, MinerState::Moving | MinerState::Mining)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySourceKind {
    Solar,
    Wind,
    Geothermal,
    Nuclear,
}

impl EnergySourceKind {
    pub const ALL: [EnergySourceKind; 4] = [
        EnergySourceKind::Solar,
        EnergySourceKind::Wind,
        EnergySourceKind::Geothermal,
        EnergySourceKind::Nuclear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EnergySourceKind::Solar => "solar",
            EnergySourceKind::Wind => "wind",
            EnergySourceKind::Geothermal => "geothermal",
            EnergySourceKind::Nuclear => "nuclear",
        }
    }
}

impl std::fmt::Display for EnergySourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RailKind {
    Vertical,
    Horizontal,
    /// Where the door run meets the cross run.
    Junction,
    /// Where the branch leaves the cross run.
    Branch,
    End,
}

/// Ore counts carried by a miner.
pub type Inventory = BTreeMap<OreKind, u32>;

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub meta: MetaState,
    /// Dense, ordered by hire; ids never reused.
    pub miners: Vec<Miner>,
    pub ores: Vec<Ore>,
    pub rails: Vec<Rail>,
    /// Cumulative units collected per ore kind, for display.
    pub resources: BTreeMap<OreKind, u64>,
    /// Units per second collected during the last tick.
    pub resource_rate: BTreeMap<OreKind, f64>,
    pub money: f64,
    /// Money per second deposited during the last tick.
    pub money_rate: f64,
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub active_mine: MineId,
    pub mines: BTreeMap<MineId, MineState>,
    pub energy: EnergyState,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    pub tick: u64,
    pub seed: u64,
    pub schema_version: u32,
    pub content_version: String,
    /// Simulated seconds elapsed at the end of the last tick.
    pub last_update_time: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_miner_id: u64,
    pub next_ore_id: u64,
    pub next_energy_source_id: u64,
    pub next_rail_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ore {
    pub id: OreId,
    pub kind: OreKind,
    pub position: Position,
    pub depleted: bool,
    /// Seconds remaining until respawn; 0 while active.
    pub regeneration_time: f64,
    pub max_regeneration_time: f64,
}

impl Ore {
    /// Fraction of the respawn timer already elapsed (0 for active ores).
    pub fn regeneration_progress(&self) -> f64 {
        if !self.depleted || self.max_regeneration_time <= 0.0 {
            return 0.0;
        }
        (1.0 - self.regeneration_time / self.max_regeneration_time).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Miner {
    pub id: MinerId,
    pub name: String,
    pub kind: MinerKind,
    pub efficiency: f64,
    pub speed: f64,
    pub capacity: f64,
    pub specialization: Option<OreKind>,
    pub position: Position,
    pub target_position: Option<Position>,
    pub state: MinerState,
    pub inventory: Inventory,
    /// Cached sum of inventory × ore value.
    pub inventory_value: f64,
    pub last_dropped_value: Option<f64>,
    pub target_ore_id: Option<OreId>,
    pub mining_progress: f64,
    pub rest_progress: Option<f64>,
    pub rest_duration: Option<f64>,
    /// Price paid at hire.
    pub cost: f64,
}

impl Miner {
    /// Total units carried across all ore kinds.
    pub fn carried(&self) -> u32 {
        self.inventory.values().sum()
    }

    /// Whole units that still fit under `capacity`.
    pub fn free_slots(&self) -> u32 {
        let free = (self.capacity - f64::from(self.carried())).floor();
        if free <= 0.0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let slots = free as u32;
            slots
        }
    }

    pub fn is_inventory_full(&self) -> bool {
        self.free_slots() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyState {
    pub current_energy: f64,
    pub max_energy: f64,
    /// Generation per second computed on the last update.
    pub energy_regen_rate: f64,
    /// Consumption per second computed on the last update.
    pub energy_consumption: f64,
    pub energy_sources: Vec<EnergySource>,
    pub is_blackout: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySource {
    pub id: EnergySourceId,
    pub kind: EnergySourceKind,
    pub level: u32,
    pub efficiency: f64,
    /// Last price paid; the next upgrade costs `floor(cost × growth)`.
    pub cost: f64,
    pub energy_output: f64,
    pub maintenance_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineState {
    pub id: MineId,
    pub unlocked: bool,
    /// The mine door, where miners drop off their haul.
    pub base_position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rail {
    pub id: RailId,
    pub tile: Tile,
    pub position: Position,
    pub kind: RailKind,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: CommandId,
    pub issued_tick: u64,
    pub execute_at_tick: u64,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    HireMiner { kind: MinerKind },
    BuyUpgrade { upgrade_id: UpgradeId },
    UnlockMine { mine_id: MineId },
    SwitchMine { mine_id: MineId },
    BuildEnergySource { kind: EnergySourceKind },
    UpgradeEnergySource { source_id: EnergySourceId },
    ClickOre { ore_id: OreId },
    ClickBase,
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    MinerHired {
        miner_id: MinerId,
        kind: MinerKind,
        cost: f64,
        specialization: Option<OreKind>,
    },
    UpgradePurchased {
        upgrade_id: UpgradeId,
        level: u32,
        cost: f64,
    },
    MineUnlocked {
        mine_id: MineId,
        cost: f64,
    },
    MineSwitched {
        from: MineId,
        to: MineId,
        ore_count: usize,
    },
    EnergySourceBuilt {
        source_id: EnergySourceId,
        kind: EnergySourceKind,
        cost: f64,
    },
    EnergySourceUpgraded {
        source_id: EnergySourceId,
        level: u32,
        cost: f64,
    },
    TargetAcquired {
        miner_id: MinerId,
        ore_id: OreId,
    },
    OreCollected {
        miner_id: MinerId,
        ore_id: OreId,
        kind: OreKind,
        amount: u32,
    },
    OreDepleted {
        ore_id: OreId,
    },
    OreRegenerated {
        ore_id: OreId,
    },
    MoneyDeposited {
        miner_id: MinerId,
        amount: f64,
    },
    BlackoutStarted {
        current_energy: f64,
    },
    BlackoutEnded {
        current_energy: f64,
    },
    OreInspected {
        ore_id: OreId,
        kind: OreKind,
        value: f64,
    },
    BaseInspected {
        miners_resting: usize,
        carried_value: f64,
    },
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContent {
    pub content_version: String,
    pub ores: BTreeMap<OreKind, OreDef>,
    pub miners: BTreeMap<MinerKind, MinerDef>,
    pub energy_sources: BTreeMap<EnergySourceKind, EnergySourceDef>,
    pub upgrades: Vec<UpgradeDef>,
    pub mines: Vec<MineDef>,
    pub constants: Constants,
}

impl GameContent {
    /// Static ore data. Panics on a kind missing from the catalog: content authoring error.
    pub fn ore(&self, kind: OreKind) -> &OreDef {
        self.ores
            .get(&kind)
            .unwrap_or_else(|| panic!("ore '{kind}' not found in content"))
    }

    /// Static miner data. Panics on a kind missing from the catalog: content authoring error.
    pub fn miner(&self, kind: MinerKind) -> &MinerDef {
        self.miners
            .get(&kind)
            .unwrap_or_else(|| panic!("miner '{kind}' not found in content"))
    }

    pub fn energy_source(&self, kind: EnergySourceKind) -> &EnergySourceDef {
        self.energy_sources
            .get(&kind)
            .unwrap_or_else(|| panic!("energy source '{kind}' not found in content"))
    }

    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| &u.id == id)
    }

    pub fn mine(&self, id: &MineId) -> Option<&MineDef> {
        self.mines.iter().find(|m| &m.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OreDef {
    pub base_yield: f64,
    /// Mining-time divisor.
    pub hardness: f64,
    /// Currency per unit.
    pub value: f64,
    /// Selection weight.
    pub rarity: f64,
    /// Seconds to respawn after depletion.
    pub regeneration_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerDef {
    pub name: String,
    pub description: String,
    pub base_efficiency: f64,
    pub base_speed: f64,
    pub base_capacity: f64,
    pub base_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySourceDef {
    pub name: String,
    pub base_cost: f64,
    pub base_output: f64,
    pub base_maintenance: f64,
    pub efficiency_multiplier: f64,
    pub max_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: String,
    pub description: String,
    pub base_cost: f64,
    pub cost_multiplier: f64,
    #[serde(default)]
    pub max_level: Option<u32>,
    pub effect: UpgradeEffect,
}

/// What buying a level of an upgrade does. Miner-stat effects recompute the
/// stat from the miner's baseline, never from its current value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UpgradeEffect {
    MinerEfficiency { per_level: f64 },
    MinerSpeed { per_level: f64 },
    MinerCapacity { per_level: f64 },
    /// Scales the rare-ore chance of ore fields generated afterwards.
    RareOreChance { per_level: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineDef {
    pub id: MineId,
    pub name: String,
    pub description: String,
    pub cost: f64,
    pub unlocked: bool,
    pub resource_multiplier: f64,
    pub rare_ore_chance: f64,
    pub ore_count: u32,
    pub available_area: AreaDef,
}

/// Floor area of a mine, in tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AreaDef {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    pub starting_money: f64,
    pub max_energy: f64,
    /// Generation with no sources built, per second.
    pub base_energy_regen: f64,
    pub mining_energy_per_second: f64,
    pub movement_energy_per_second: f64,
    /// Blackout starts when energy falls to this fraction of max.
    pub blackout_threshold: f64,
    /// Blackout ends once energy climbs strictly above this fraction of max.
    pub blackout_recovery_threshold: f64,
    /// Map units per second at speed 1.0.
    pub move_speed_factor: f64,
    pub arrival_epsilon: f64,
    pub rest_duration_seconds: f64,
    pub hire_cost_growth: f64,
    pub hire_min_spacing: f64,
    pub hire_placement_attempts: u32,
    pub energy_upgrade_cost_growth: f64,
    /// Extra mining speed and yield per pickaxe level, on top of the stat upgrade.
    pub pickaxe_bonus_per_level: f64,
    pub expert_specialization_efficiency: f64,
    pub expert_specialization_yield: f64,
    pub expert_specializations: Vec<OreKind>,
    pub engineer_yield_bonus: f64,
    pub prospector_top_fraction: f64,
    pub engineer_top_fraction: f64,
    /// Ores worth more than this are boosted by a mine's rare-ore chance.
    pub rare_value_threshold: f64,
    pub yield_jitter_min: f64,
    pub yield_jitter_max: f64,
    pub map_width_tiles: u32,
    pub map_height_tiles: u32,
}
