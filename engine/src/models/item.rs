//! Item model
//!
//! Items are a closed enumeration of kinds. Most are cosmetic; a fixed
//! subset carries a battle effect, resolved through [`ItemKind::effect`].
//! At most one active non-consumable effect applies per battle side at a
//! time, except for kinds that explicitly stack (Maracas + Bongos).
//!
//! A wrapped item is inert: the effect mapping returns nothing for it until
//! it is unwrapped (market concern, outside this crate).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::models::battle::Stance;

bitflags! {
    /// Item state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct ItemFlags: u8 {
        /// Bound to its wrestler; cannot be unequipped or traded
        const LOCKED  = 1 << 0;
        /// Gift-wrapped; inert until unwrapped
        const WRAPPED = 1 << 1;
    }
}

/// Where an item currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemLocation {
    #[default]
    None,
    Wrestler {
        wrestler_id: u64,
    },
    Market,
    Room,
}

/// Battle effect carried by an item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Flat percentage added to the attack boost at preparation.
    /// `stacks` marks the Maracas/Bongos pair that may combine.
    AttackBoost { pct: u32, stacks: bool },

    /// Flat percentage added to the defense boost at preparation
    DefenseBoost { pct: u32, stacks: bool },

    /// Added to every chance draw
    ChanceBonus(u32),

    /// Attack bonus in exchange for locking the first chosen move
    ChoiceLock { attack_pct: u32 },

    /// Survive one otherwise-lethal hit at 1 stamina; consumed on trigger
    DeathPrevention {
        /// LoserMask variant also halves the holder's outgoing damage
        halve_outgoing: bool,
    },

    /// Reaction: curses the opponent the first time they use a counter-class
    /// move; consumed on trigger
    TrapCurse,

    /// One-time flat indirect damage to the opponent on turn 2
    Bomb { damage: u32 },

    /// Thorns: an attacker landing direct damage on the holder takes this back
    Nails { damage: u32 },

    /// Any item activation on the opposing side deals this back to them
    ShockChip { damage: u32 },

    /// Swaps both sides' equipped items at preparation (cross-wiring)
    SwapItems,

    /// Nullifies a SwapItems attempt from the other side
    NullifySwap,

    /// Forces the starting stance
    ForceStance(Stance),

    /// Doubles the XP award at settlement; consumed
    DoubleXp,

    /// Heals the holder this much every turn
    RegenPerTurn(u32),

    /// Attack bonus with a recoil percentage on every landed attack
    Spiked { attack_pct: u32, recoil_pct: u32 },

    /// Curses the opponent's lead fighter at preparation
    StartCurse,
}

impl ItemEffect {
    /// Consumables disappear after their effect triggers once
    pub fn is_consumable(&self) -> bool {
        matches!(
            self,
            ItemEffect::DeathPrevention {
                halve_outgoing: false
            } | ItemEffect::TrapCurse
                | ItemEffect::Bomb { .. }
                | ItemEffect::DoubleXp
        )
    }

    /// Whether this effect stacks with another active effect on the same side
    pub fn stacks(&self) -> bool {
        matches!(
            self,
            ItemEffect::AttackBoost { stacks: true, .. }
                | ItemEffect::DefenseBoost { stacks: true, .. }
        )
    }
}

/// Closed enumeration of item kinds
///
/// Kinds with no battle effect are cosmetic; they exist for the market and
/// room systems outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    // Instruments
    Maracas,
    Bongos,
    Guitarra,
    Trompeta,
    Accordion,
    // Consumables
    FocusBanana,
    EnergyDrink,
    TrapCard,
    Bomb,
    HealingHerb,
    Tamales,
    Churros,
    Horchata,
    Elote,
    Pozole,
    // Combat gear
    LoserMask,
    ChoiceBelt,
    SpikedCollar,
    Nails,
    ShockChip,
    LuckyHorseshoe,
    RiggedGlove,
    InsulatedBoots,
    CursedDoll,
    BrassKnuckles,
    SteelChair,
    Ropes,
    Turnbuckle,
    // Stance gear
    ClownNose,
    ZombieMask,
    CapeOfWinds,
    // Masks (cosmetic)
    TigerMask,
    EagleMask,
    SnakeMask,
    SkullMask,
    DevilMask,
    AngelMask,
    GoldMask,
    SilverMask,
    BronzeMask,
    JadeMask,
    ObsidianMask,
    CrimsonMask,
    AzureMask,
    EmeraldMask,
    StarMask,
    MoonMask,
    SunMask,
    StormMask,
    FlameMask,
    FrostMask,
    // Capes and outfits (cosmetic)
    VelvetCape,
    LeatherCape,
    SequinCape,
    FeatherBoa,
    ChampionRobe,
    TrainingRobe,
    LuchaTights,
    GoldenBoots,
    SilverBoots,
    WrestlingSinglet,
    ReturnJacket,
    RetroJacket,
    // Accessories (cosmetic)
    Sombrero,
    Bandana,
    Medallion,
    PromoPoster,
    AutographCard,
    TitleBelt,
    TagTeamBelt,
    MidnightBelt,
    ReplicaBelt,
    Cowbell,
    AirHorn,
    FoamFinger,
    // Room furniture (cosmetic)
    TrophyShelf,
    PosterFrame,
    NeonSign,
    JukeBox,
    LavaLamp,
    BeanBag,
    MiniFridge,
    ArcadeCabinet,
    DiscoBall,
    PracticeDummy,
    WeightBench,
    SpeedBag,
    // Collectibles (cosmetic)
    GoldCoin,
    AncientIdol,
    CrystalSkull,
    MysteryEgg,
    SnowGlobe,
    MusicBox,
    PocketWatch,
    LoteriaDeck,
    VintagePoster,
    ConfettiCannon,
}

impl ItemKind {
    /// Battle effect of this kind, if any
    pub fn effect(&self) -> Option<ItemEffect> {
        match self {
            ItemKind::Maracas => Some(ItemEffect::AttackBoost {
                pct: 5,
                stacks: true,
            }),
            ItemKind::Bongos => Some(ItemEffect::DefenseBoost {
                pct: 5,
                stacks: true,
            }),
            ItemKind::FocusBanana => Some(ItemEffect::DeathPrevention {
                halve_outgoing: false,
            }),
            ItemKind::LoserMask => Some(ItemEffect::DeathPrevention {
                halve_outgoing: true,
            }),
            ItemKind::ChoiceBelt => Some(ItemEffect::ChoiceLock { attack_pct: 25 }),
            ItemKind::SpikedCollar => Some(ItemEffect::Spiked {
                attack_pct: 15,
                recoil_pct: 5,
            }),
            ItemKind::Nails => Some(ItemEffect::Nails { damage: 8 }),
            ItemKind::ShockChip => Some(ItemEffect::ShockChip { damage: 12 }),
            ItemKind::LuckyHorseshoe => Some(ItemEffect::ChanceBonus(10)),
            ItemKind::RiggedGlove => Some(ItemEffect::SwapItems),
            ItemKind::InsulatedBoots => Some(ItemEffect::NullifySwap),
            ItemKind::CursedDoll => Some(ItemEffect::StartCurse),
            ItemKind::TrapCard => Some(ItemEffect::TrapCurse),
            ItemKind::Bomb => Some(ItemEffect::Bomb { damage: 25 }),
            ItemKind::HealingHerb => Some(ItemEffect::RegenPerTurn(6)),
            ItemKind::EnergyDrink => Some(ItemEffect::DoubleXp),
            ItemKind::ClownNose => Some(ItemEffect::ForceStance(Stance::Clown)),
            ItemKind::ZombieMask => Some(ItemEffect::ForceStance(Stance::Zombie)),
            ItemKind::CapeOfWinds => Some(ItemEffect::ForceStance(Stance::Alternative)),
            _ => None,
        }
    }
}

/// An item record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: u64,
    kind: ItemKind,
    flags: ItemFlags,
    location: ItemLocation,
}

impl Item {
    pub fn new(id: u64, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            flags: ItemFlags::empty(),
            location: ItemLocation::None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ItemFlags) {
        self.flags = flags;
    }

    pub fn location(&self) -> ItemLocation {
        self.location
    }

    pub fn set_location(&mut self, location: ItemLocation) {
        self.location = location;
    }

    /// Effect seen by the battle engine; wrapped items are inert
    pub fn active_effect(&self) -> Option<ItemEffect> {
        if self.flags.contains(ItemFlags::WRAPPED) {
            None
        } else {
            self.kind.effect()
        }
    }
}
