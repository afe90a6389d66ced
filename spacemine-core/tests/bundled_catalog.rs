use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use spacemine_core::{
    AsteroidCatalog, CatalogFilter, DroneTiers, MiningEngine, Outputs, StaticCatalogLoader,
    TableConfig, TierMask,
};
use std::collections::BTreeSet;

#[test]
fn bundled_catalog_shape() {
    let catalog = AsteroidCatalog::load_from_static().unwrap();
    let tiers = DroneTiers::standard();
    catalog.validate(&tiers).unwrap();
    assert_eq!(catalog.asteroids.len(), 41);

    let packs: Vec<_> = catalog.packs().into_iter().collect();
    assert_eq!(
        packs,
        vec![
            "GoodGenerator",
            "HardcoreEnderExpansion",
            "bartworks",
            "kubatech",
            "miscutils"
        ]
    );

    let base = catalog.expand(&tiers, &CatalogFilter::base()).unwrap();
    assert_eq!(base.len(), 174);
    let everything = catalog
        .expand(&tiers, &CatalogFilter::with_packs(catalog.packs()))
        .unwrap();
    assert_eq!(everything.len(), 225);

    let ids: BTreeSet<_> = catalog.asteroids.iter().map(|asteroid| asteroid.id.as_str()).collect();
    assert_eq!(ids.len(), catalog.asteroids.len());
}

#[test]
fn coal_asteroid_matches_reference_values() {
    let catalog = AsteroidCatalog::load_from_static().unwrap();
    let coal = catalog.get("coalAsteroid").unwrap();
    assert_eq!((coal.distance.min, coal.distance.max), (1, 40));
    assert_eq!(coal.duration, 200);
    assert_eq!(coal.eut, 1920);
    assert_eq!(coal.weight, 200);
    assert!(matches!(&coal.outputs, Outputs::Ores { prefix, .. } if prefix == "oreEndstone"));
    assert_eq!(coal.outputs.chance_total(), 10_000);

    let clay = catalog.get("clayAsteroid").unwrap();
    assert!(!clay.outputs.scales_power());
}

#[test]
fn lv_drones_near_the_station() {
    let engine = MiningEngine::new(StaticCatalogLoader);
    let tables = engine.build_tables().unwrap();
    let lv = TierMask::NONE.with(engine.tiers().by_name("LV").unwrap().key);
    let result = tables.lookup(1, lv, 1).unwrap();
    let names: BTreeSet<_> = result
        .recipes()
        .map(|recipe| recipe.payload.asteroid.as_str())
        .collect();
    assert_eq!(
        names,
        BTreeSet::from(["coalAsteroid", "ironAsteroid", "saltAsteroid"])
    );
    assert_eq!(result.total_weight(), 200 + 300 + 600);
    assert!((result.expected_duration() - 200.0).abs() < f64::EPSILON);

    let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
    let drawn = result.sample(&mut rng);
    assert!(names.contains(drawn.payload.asteroid.as_str()));
}

#[test]
fn module_tiers_unlock_deeper_asteroids() {
    let engine = MiningEngine::new(StaticCatalogLoader);
    let tables = engine.build_tables_with(&TableConfig::default()).unwrap();
    let counts: Vec<_> = tables.iter().map(|(_, table)| table.recipe_count()).collect();
    assert!(counts.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(counts.last().copied(), Some(174));

    let cheese = |module_tier| {
        tables
            .lookup(150, TierMask::ALL, module_tier)
            .unwrap()
            .recipes()
            .any(|recipe| recipe.payload.asteroid == "cheeseAsteroid")
    };
    assert!(!cheese(1));
    assert!(cheese(2));
}
