//! Persistent storage written by sprite groups and carried between
//! resolutions, test-runs and save files.

use spritegroup::eval::{Evaluator, ResolverResult};
use spritegroup::features::industry::{
    Industry, IndustryResolver, IndustryScope, ProspectiveIndustry,
};
use spritegroup::features::tile::{MapSize, TileIndex, TileMap};
use spritegroup::features::town::{Town, TownResolver, TownScope};
use spritegroup::group::{Adjust, AdjustOp, DeterministicGroup, GroupSize, VarScope};
use spritegroup::pool::{NodeRef, SpriteGroupPool};
use spritegroup::resolver::ResolverObject;
use spritegroup::storage::{PersistentStorageMap, ResetPolicy, TemporaryStorage};

/// Graph pair: `store(scope)` writes `value` to slot `slot`, `load(scope)`
/// reads it back as a callback result.
struct StorageGraph {
    pool: SpriteGroupPool,
    store_self: NodeRef,
    load_self: NodeRef,
    store_parent: NodeRef,
    load_parent: NodeRef,
}

fn storage_graph(slot: u32, value: u32) -> StorageGraph {
    let mut pool = SpriteGroupPool::new();
    let mut calc = |scope: VarScope, adjusts: Vec<Adjust>| {
        let det = DeterministicGroup::calculated(scope, GroupSize::Dword, adjusts);
        pool.allocate(det.into()).expect("pool has room")
    };
    let store = || vec![Adjust::constant(value), Adjust::constant(slot).op(AdjustOp::Stop)];
    let load = || vec![Adjust::persistent(slot as u8)];
    let store_self = calc(VarScope::Object, store());
    let load_self = calc(VarScope::Object, load());
    let store_parent = calc(VarScope::Parent, store());
    let load_parent = calc(VarScope::Parent, load());
    StorageGraph { pool, store_self, load_self, store_parent, load_parent }
}

fn town() -> Town {
    Town { index: 3, xy: TileIndex(0x1020), population: 1500, num_houses: 40, is_capital: false }
}

#[test]
fn test_town_storage_per_grf() {
    let graph = storage_graph(1, 55);
    let evaluator = Evaluator::new(&graph.pool).with_reset_policy(ResetPolicy::PerResolve);
    let town = town();
    let mut map = PersistentStorageMap::new();
    let mut temp = TemporaryStorage::new();

    {
        let scope = TownScope::new(&town).with_storage(&mut map, 0xAAAA);
        let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
        assert_eq!(evaluator.resolve(graph.store_self, &mut object), ResolverResult::Callback(55));
    }
    {
        let scope = TownScope::new(&town).with_storage(&mut map, 0xAAAA);
        let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
        assert_eq!(evaluator.resolve(graph.load_self, &mut object), ResolverResult::Callback(55));
    }
    {
        // Another data file sees its own, still missing, array.
        let scope = TownScope::new(&town).with_storage(&mut map, 0xBBBB);
        let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
        assert_eq!(evaluator.resolve(graph.load_self, &mut object), ResolverResult::Callback(0));
    }

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(town.entity(), 0xAAAA).map(|s| s.get(1)), Some(55));
}

#[test]
fn test_failed_town_write_leaves_no_storage() {
    let graph = storage_graph(99, 5);
    let evaluator = Evaluator::new(&graph.pool);
    let town = town();
    let mut map = PersistentStorageMap::new();
    let mut temp = TemporaryStorage::new();

    let scope = TownScope::new(&town).with_storage(&mut map, 0xAB);
    let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
    assert_eq!(evaluator.resolve(graph.store_self, &mut object), ResolverResult::Failed);
    drop(object);
    assert!(map.is_empty());
}

#[test]
fn test_zero_write_creates_no_storage() {
    let graph = storage_graph(1, 0);
    let evaluator = Evaluator::new(&graph.pool);
    let town = town();
    let mut map = PersistentStorageMap::new();
    let mut temp = TemporaryStorage::new();

    let scope = TownScope::new(&town).with_storage(&mut map, 0xAAAA);
    let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
    evaluator.resolve(graph.store_self, &mut object);
    drop(object);
    assert!(map.is_empty());
}

#[test]
fn test_industry_storage_and_town_parent() {
    let graph = storage_graph(4, 12);
    let evaluator = Evaluator::new(&graph.pool);
    let tiles = TileMap::new(MapSize::default());
    let town = town();
    let mut towns = PersistentStorageMap::new();
    let mut industry = Industry { index: 9, grfid: 0xCCCC, ..Industry::default() };
    let mut temp = TemporaryStorage::new();

    {
        let resolver = IndustryResolver::new(
            IndustryScope::built(&mut industry, &tiles),
            TownScope::new(&town).with_storage(&mut towns, 0xCCCC),
        );
        let mut object = ResolverObject::new(resolver, &mut temp);
        assert_eq!(evaluator.resolve(graph.store_self, &mut object), ResolverResult::Callback(12));
        assert_eq!(evaluator.resolve(graph.store_parent, &mut object), ResolverResult::Callback(12));
    }

    let psa = industry.psa.as_ref().expect("storage created on first write");
    assert_eq!(psa.get(4), 12);
    assert_eq!(psa.grfid, 0xCCCC);
    assert_eq!(psa.owner, industry.entity());
    assert_eq!(towns.get(town.entity(), 0xCCCC).map(|s| s.get(4)), Some(12));
}

#[test]
fn test_prospective_industry_cannot_write() {
    let graph = storage_graph(2, 8);
    let evaluator = Evaluator::new(&graph.pool);
    let tiles = TileMap::new(MapSize::default());
    let town = town();
    let mut towns = PersistentStorageMap::new();
    let mut temp = TemporaryStorage::new();

    let check = ProspectiveIndustry { tile: TileIndex(0x0404), industry_type: 2, ..Default::default() };
    let resolver = IndustryResolver::new(
        IndustryScope::prospective(check, &tiles),
        TownScope::new(&town).with_storage(&mut towns, 0xCCCC),
    );
    let mut object = ResolverObject::new(resolver, &mut temp);
    evaluator.resolve(graph.store_self, &mut object);
    evaluator.resolve(graph.store_parent, &mut object);
    assert_eq!(evaluator.resolve(graph.load_parent, &mut object), ResolverResult::Callback(0));
    drop(object);
    assert!(towns.is_empty());
}

#[test]
fn test_test_run_changes_are_reverted() {
    let graph = storage_graph(1, 77);
    let evaluator = Evaluator::new(&graph.pool);
    let town = town();
    let mut map = PersistentStorageMap::new();
    map.get_or_create(town.entity(), 0xAAAA, 16).set(1, 5);
    map.clear_changes(true);
    let mut temp = TemporaryStorage::new();

    {
        let scope = TownScope::new(&town).with_storage(&mut map, 0xAAAA);
        let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
        evaluator.resolve(graph.store_self, &mut object);
    }
    assert_eq!(map.get(town.entity(), 0xAAAA).map(|s| s.get(1)), Some(77));

    // A command test-run: discard what the resolution wrote.
    map.clear_changes(false);
    let storage = map.get(town.entity(), 0xAAAA).expect("array kept");
    assert_eq!(storage.get(1), 5);
    assert!(!storage.has_changes());
}

#[test]
fn test_storage_survives_save_round_trip() {
    let graph = storage_graph(0, 31);
    let evaluator = Evaluator::new(&graph.pool);
    let town = town();
    let mut map = PersistentStorageMap::new();
    let mut temp = TemporaryStorage::new();
    {
        let scope = TownScope::new(&town).with_storage(&mut map, 0xAAAA);
        let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
        evaluator.resolve(graph.store_self, &mut object);
    }

    map.clear_changes(true);
    let saved = serde_json::to_string(&map).expect("map serializes");
    let mut loaded: PersistentStorageMap = serde_json::from_str(&saved).expect("map deserializes");
    assert_eq!(loaded, map);

    let scope = TownScope::new(&town).with_storage(&mut loaded, 0xAAAA);
    let mut object = ResolverObject::new(TownResolver::new(scope), &mut temp);
    assert_eq!(evaluator.resolve(graph.load_self, &mut object), ResolverResult::Callback(31));
}
