use std::collections::HashMap;

pub fn builtin_rulesets() -> HashMap<&'static str, &'static str> {
    HashMap::from([("blades", include_str!("../content/rulesets/blades.yaml"))])
}

pub fn builtin_characters() -> HashMap<&'static str, &'static str> {
    HashMap::from([("cutter", include_str!("../content/characters/cutter.json"))])
}

pub fn builtin_catalogs() -> HashMap<&'static str, &'static str> {
    HashMap::from([("en", include_str!("../content/lang/en.json"))])
}
