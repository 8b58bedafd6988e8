use std::sync::Arc;
use twinscope::config::{HVAC_ZONE_MODEL, OCCUPANCY_ZONE_MODEL};
use twinscope::{InMemoryTwinStore, NestedTwin, TraversalConfig, Twin, TwinId, TwinService};

const BUILDING: &str = "dtmi:com:willowinc:Building;1";
const LEVEL: &str = "dtmi:com:willowinc:Level;1";
const ROOM: &str = "dtmi:com:willowinc:Room;1";
const AHU: &str = "dtmi:com:willowinc:AirHandlingUnit;1";
const VAV: &str = "dtmi:com:willowinc:VAVBox;1";
const SENSOR: &str = "dtmi:com:willowinc:TemperatureSensor;1";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Twinscope v{}", twinscope::version());
    println!("==========================================");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => TraversalConfig::from_file(&path)?,
        None => TraversalConfig::default(),
    };
    let service = TwinService::new(Arc::new(demo_building()), config);

    demo_trees(&service).await?;
    demo_system_graph(&service).await?;

    Ok(())
}

/// One building, two levels, an air handler feeding a zone of VAV boxes
fn demo_building() -> InMemoryTwinStore {
    let mut store = InMemoryTwinStore::new();

    store.add_twin(Twin::new("bld-1", BUILDING).with_property("name", "Head Office"));
    for level in ["lvl-1", "lvl-2"] {
        store.add_twin(Twin::new(level, LEVEL));
        store.relate(level, "isPartOf", "bld-1");
    }
    for (room, level, name) in [
        ("room-110", "lvl-1", "Room 110"),
        ("room-101", "lvl-1", "Room 101"),
        ("room-201", "lvl-2", "Room 201"),
    ] {
        store.add_twin(Twin::new(room, ROOM).with_property("name", name));
        store.relate(room, "isPartOf", level);
    }

    store.add_twin(Twin::new("ahu-1", AHU));
    store.relate("ahu-1", "locatedIn", "lvl-1");
    store.add_twin(Twin::new("zone-1", HVAC_ZONE_MODEL));
    store.relate("zone-1", "isFedBy", "ahu-1");
    for (vav, room) in [("vav-101", "room-101"), ("vav-110", "room-110")] {
        store.add_twin(Twin::new(vav, VAV));
        store.relate(vav, "isFedBy", "ahu-1");
        store.relate(vav, "locatedIn", room);
        store.relate(vav, "isPartOf", "zone-1");
    }

    store.add_twin(Twin::new("occ-101", OCCUPANCY_ZONE_MODEL));
    store.relate("occ-101", "isPartOf", "room-101");
    store.add_twin(Twin::new("temp-101", SENSOR).with_property("unit", "degC"));
    store.relate("temp-101", "isCapabilityOf", "vav-101");
    store.relate("temp-101", "hostedBy", "ahu-1");

    store
}

async fn demo_trees(service: &TwinService<InMemoryTwinStore>) -> anyhow::Result<()> {
    println!("=== Demo 1: Location trees ===");
    let follow = vec!["isPartOf".to_string(), "locatedIn".to_string()];

    let trees = service
        .trees_by_models(&[BUILDING.into(), LEVEL.into(), ROOM.into()], &[], &follow, &[], true)
        .await?;
    println!("Rooted trees for building models:");
    for tree in &trees {
        print_tree(tree, 1);
    }

    let children = service
        .trees_by_ids(&[TwinId::new("lvl-1")], &[ROOM.into()], &[], &follow)
        .await?;
    println!("\nChildren reached from lvl-1 (incoming, rooms only): {}", children.len());
    Ok(())
}

async fn demo_system_graph(service: &TwinService<InMemoryTwinStore>) -> anyhow::Result<()> {
    println!("\n=== Demo 2: System graph ===");
    let outcome = service.system_graph(&[TwinId::new("vav-101")]).await?;

    println!(
        "{} statements over {} twins ({} expanded, max distance {}, {:?})",
        outcome.graph.len(),
        outcome.graph.node_count(),
        outcome.expanded,
        outcome.max_distance,
        outcome.termination
    );
    for statement in outcome.graph.statements() {
        println!("  {}", statement);
    }

    println!("\nSnapshot:");
    println!("{}", serde_json::to_string_pretty(&outcome.graph.snapshot())?);
    Ok(())
}

fn print_tree(tree: &NestedTwin, depth: usize) {
    let indent = "  ".repeat(depth);
    match tree.twin.name() {
        Some(name) => println!("{}{} [{}] ({})", indent, name, tree.twin.id, tree.twin.model_id),
        None => println!("{}{} ({})", indent, tree.twin.id, tree.twin.model_id),
    }
    for child in &tree.children {
        print_tree(child, depth + 1);
    }
}
