/// Reference vocabulary of keyword abilities, evergreen first.
pub const KEYWORDS: &[&str] = &[
    "Deathtouch",
    "Defender",
    "Double strike",
    "Equip",
    "First strike",
    "Flash",
    "Flying",
    "Haste",
    "Hexproof",
    "Indestructible",
    "Intimidate",
    "Lifelink",
    "Menace",
    "Protection",
    "Reach",
    "Shroud",
    "Trample",
    "Vigilance",
    "Ward",
    "Adapt",
    "Affinity",
    "Aftermath",
    "Amass",
    "Annihilator",
    "Ascend",
    "Awaken",
    "Battalion",
    "Bestow",
    "Bloodthirst",
    "Cascade",
    "Changeling",
    "Cipher",
    "Convoke",
    "Crew",
    "Dash",
    "Delve",
    "Devour",
    "Dredge",
    "Evoke",
    "Exalted",
    "Explore",
    "Extort",
    "Fabricate",
    "Fading",
    "Fateful hour",
    "Ferocious",
    "Flicker",
    "Forecast",
    "Fortify",
    "Graft",
    "Gravestorm",
    "Heroic",
    "Improvise",
    "Ingest",
    "Kicker",
    "Landfall",
    "Level up",
    "Madness",
    "Mentor",
    "Metalcraft",
    "Miracle",
    "Morph",
    "Mutate",
    "Ninjutsu",
    "Persist",
    "Proliferate",
    "Raid",
    "Rally",
    "Rampage",
    "Rebound",
    "Reinforce",
    "Renown",
    "Replicate",
    "Retrace",
    "Riot",
    "Scavenge",
    "Scry",
    "Shadow",
    "Skulk",
    "Soulbond",
    "Splice",
    "Storm",
    "Strive",
    "Suspend",
    "Totem armor",
    "Transfigure",
    "Transmute",
    "Undying",
    "Unearth",
    "Vanishing",
    "Vigor",
    "Wither",
];

/// Keywords appearing in `oracle_text`, in vocabulary order.
///
/// Plain case-insensitive substring matching, so short names can match inside
/// longer words ("Scry" in "Scrying"). Intentional, not word-boundary aware.
pub fn extract(oracle_text: &str) -> Vec<&'static str> {
    let haystack = oracle_text.to_lowercase();
    KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(&kw.to_lowercase()))
        .copied()
        .collect()
}
