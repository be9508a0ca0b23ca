//! Prints a summary of a UGX file and loads every grid in it.
//!
//! Usage:
//! ```text
//! cargo run --example ugx_info -- path/to/mesh.ugx
//! RUST_LOG=ugx=debug cargo run --example ugx_info -- path/to/mesh.ugx
//! ```

use ugx::projection::ProjectorFactory;
use ugx::{AttachmentRegistry, ElementKind, FileInfo, GridReader, UgxError};

fn main() -> Result<(), UgxError> {
    // Default: WARN for everything, INFO for ugx.
    // Override with RUST_LOG env var (e.g. RUST_LOG=ugx=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("ugx=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: ugx_info <file.ugx>");
        return Ok(());
    };

    let info = FileInfo::parse_file(&path)?;
    for g in 0..info.num_grids() {
        let grid = info.grid_info(g)?;
        println!(
            "grid {g} '{}': topological dim {}, physical dim {}",
            grid.name,
            grid.topological_dimension(),
            grid.physical_dimension()
        );
        if let Some(bb) = grid.bounding_box {
            println!("  bounds {:?} .. {:?}", bb.min.coords.as_slice(), bb.max.coords.as_slice());
        }
        for sh in &grid.subset_handlers {
            println!("  subset handler '{}': {:?}", sh.name, sh.subsets);
        }
    }

    let mut reader = GridReader::parse_file(&path)?;
    let mut registry = AttachmentRegistry::new();
    let factory = ProjectorFactory::new();
    for g in 0..reader.num_grids() {
        let loaded = match reader.load_grid(g, &mut registry) {
            Ok(grid) => grid,
            Err(err) => {
                eprintln!("grid {g}: {err}");
                continue;
            }
        };
        let counts: Vec<_> = ElementKind::ALL
            .iter()
            .map(|&k| format!("{} {k}", loaded.num_elements(k)))
            .collect();
        println!("grid {g}: {}", counts.join(", "));
        for (kind, name, column) in loaded.attachments() {
            println!("  {kind} attachment '{name}' ({})", column.type_name);
        }
        for issue in reader.constraint_issues(g)? {
            println!("  unresolved: {issue}");
        }
        for ph in 0..reader.num_projection_handlers(g)? {
            let handler = reader.projection_handler(g, ph, &factory)?;
            for (subset, projector) in handler.projectors() {
                println!("  subset {subset} projected by {}", projector.type_name());
            }
        }
    }
    Ok(())
}
