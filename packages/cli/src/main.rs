//! `sgraph`: semantic graph command-line interface.
//!
//! Subcommands:
//!
//! - **`validate`**: check a graph against its ontology and rule set.
//! - **`project`**: print the id-free projection of a graph as JSON.
//! - **`render`**: print a human-readable summary of a graph's projection.
//! - **`check`**: report integrity problems in taxonomies, ontologies and rule sets.
//! - **`id`**: mint an object id, deterministic from a seed or random.
//!
//! Every file argument may be `-` to read stdin. Schemas found in
//! `SGRAPH_SCHEMA_DIR` are loaded first; see [`config::CliConfig`].

mod config;
mod schemas;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use semantic_graphs::{
    ontology, render, rules, taxonomy, FixedClock, IdSeed, ObjId, Ontology, OntologyId,
    RuleSet, RuleSetId, SchemaEntity, SemanticGraph, SemanticGraphProjector, Taxonomy,
    TaxonomyId, Validator,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use config::CliConfig;
use schemas::Schemas;

/// sgraph: semantic graph CLI
///
/// Validate, project and render graphs, and check their schemas.
#[derive(Parser)]
#[command(name = "sgraph", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a graph against its ontology and, optionally, a rule set.
    ///
    /// Prints `valid` and exits 0, or prints one error per line and exits 1.
    /// The ontology is looked up by the graph's `ontology_id` among the
    /// preloaded schemas and the file given with `--ontology`.
    Validate {
        /// Graph JSON file, or `-` for stdin.
        #[arg(short, long)]
        graph: PathBuf,

        /// Ontology JSON file.
        #[arg(short, long)]
        ontology: Option<PathBuf>,

        /// Rule set JSON file. Defaults to the graph's `rule_set_id`, if loaded.
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Also check required node and edge properties.
        #[arg(long)]
        required_properties: bool,

        /// Print the validation result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Project a graph and print the projection as JSON.
    Project {
        /// Graph JSON file, or `-` for stdin.
        #[arg(short, long)]
        graph: PathBuf,

        /// Ontology JSON file.
        #[arg(short, long)]
        ontology: Option<PathBuf>,

        /// Taxonomy JSON file.
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,

        /// Print RFC 8785 canonical JSON instead of pretty JSON.
        #[arg(long)]
        canonical: bool,
    },

    /// Project a graph and print it as human-readable text.
    Render {
        /// Graph JSON file, or `-` for stdin.
        #[arg(short, long)]
        graph: PathBuf,

        /// Ontology JSON file.
        #[arg(short, long)]
        ontology: Option<PathBuf>,

        /// Taxonomy JSON file.
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,
    },

    /// Check schemas for integrity problems.
    ///
    /// With no files, checks every preloaded schema. Exits 1 if any problem
    /// is found.
    Check {
        /// Taxonomy JSON file.
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,

        /// Ontology JSON file.
        #[arg(short, long)]
        ontology: Option<PathBuf>,

        /// Rule set JSON file.
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Print an object id.
    ///
    /// Examples:
    ///   sgraph id --seed kb:ontology   # always d7eff75c
    ///   sgraph id                      # random
    Id {
        /// Derive the id from this seed instead of generating a random one.
        #[arg(short, long)]
        seed: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = CliConfig::from_env();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut schemas = match &config.schema_dir {
        Some(dir) => Schemas::load_dir(dir).unwrap_or_else(|e| fatal(&e.to_string())),
        None => Schemas::default(),
    };

    match cli.command {
        Command::Validate {
            graph,
            ontology,
            rules,
            required_properties,
            json,
        } => {
            let graph: SemanticGraph = read_entity(&graph, "graph");
            if let Some(path) = ontology {
                add_ontology(&mut schemas, &path);
            }
            let rule_set_id = rules
                .map(|path| add_rule_set(&mut schemas, &path))
                .or_else(|| graph.rule_set_id.clone());

            let o = schemas.ontologies.get(&graph.ontology_id).unwrap_or_else(|| {
                fatal(&format!(
                    "ontology {} not found; pass --ontology or set SGRAPH_SCHEMA_DIR",
                    graph.ontology_id
                ))
            });
            let mut validator = Validator::new(o);
            if let Some(rs) = rule_set_id.and_then(|id| schemas.rule_sets.get(&id)) {
                validator = validator.with_rule_set(rs);
            }
            if required_properties {
                validator = validator.with_required_properties();
            }

            let result = validator.validate(&graph);
            if json {
                println!("{}", to_pretty(&result));
            } else if result.valid {
                println!("valid");
            } else {
                for e in &result.errors {
                    eprintln!("error: {}", e);
                }
            }
            if !result.valid {
                process::exit(1);
            }
        }

        Command::Project {
            graph,
            ontology,
            taxonomy,
            canonical,
        } => {
            let graph: SemanticGraph = read_entity(&graph, "graph");
            add_schema_files(&mut schemas, ontology.as_deref(), taxonomy.as_deref());
            let projected = project(&schemas, &config, &graph);
            if canonical {
                let json = projected
                    .canonical_json()
                    .unwrap_or_else(|e| fatal(&format!("failed to serialise projection: {}", e)));
                println!("{}", json);
            } else {
                println!("{}", to_pretty(&projected));
            }
        }

        Command::Render {
            graph,
            ontology,
            taxonomy,
        } => {
            let graph: SemanticGraph = read_entity(&graph, "graph");
            add_schema_files(&mut schemas, ontology.as_deref(), taxonomy.as_deref());
            let projected = project(&schemas, &config, &graph);
            print!("{}", render::render_projection(&projected));
        }

        Command::Check {
            taxonomy,
            ontology,
            rules,
        } => {
            let explicit = taxonomy.is_some() || ontology.is_some() || rules.is_some();
            let taxonomy_ids: Vec<TaxonomyId> = match taxonomy {
                Some(path) => vec![add_taxonomy(&mut schemas, &path)],
                None if !explicit => schemas.taxonomies.list_ids(),
                None => vec![],
            };
            let ontology_ids: Vec<OntologyId> = match ontology {
                Some(path) => vec![add_ontology(&mut schemas, &path)],
                None if !explicit => schemas.ontologies.list_ids(),
                None => vec![],
            };
            let rule_set_ids: Vec<RuleSetId> = match rules {
                Some(path) => vec![add_rule_set(&mut schemas, &path)],
                None if !explicit => schemas.rule_sets.list_ids(),
                None => vec![],
            };
            if taxonomy_ids.is_empty() && ontology_ids.is_empty() && rule_set_ids.is_empty() {
                fatal("nothing to check; pass --taxonomy, --ontology or --rules, or set SGRAPH_SCHEMA_DIR");
            }

            let mut problems = 0usize;
            for id in &taxonomy_ids {
                if let Some(t) = schemas.taxonomies.get(id) {
                    problems += report(&format!("taxonomy {}", t.taxonomy_ref), taxonomy::check_integrity(t));
                }
            }
            for id in &ontology_ids {
                if let Some(o) = schemas.ontologies.get(id) {
                    let t = schemas.taxonomies.get(&o.taxonomy_id);
                    problems += report(&format!("ontology {}", o.ontology_ref), ontology::check_integrity(o, t));
                }
            }
            for id in &rule_set_ids {
                if let Some(rs) = schemas.rule_sets.get(id) {
                    let label = format!("rule set {}", rs.rule_set_ref);
                    match schemas.ontologies.get(&rs.ontology_id) {
                        Some(o) => problems += report(&label, rules::check_integrity(rs, o)),
                        None => {
                            println!("{}: ontology {} not loaded", label, rs.ontology_id);
                            problems += 1;
                        }
                    }
                }
            }
            if problems > 0 {
                process::exit(1);
            }
        }

        Command::Id { seed } => {
            let id = match seed {
                Some(raw) => {
                    let seed = IdSeed::new(&raw).unwrap_or_else(|e| fatal(&e.to_string()));
                    ObjId::from_seed(seed.as_str())
                }
                None => ObjId::random(),
            };
            println!("{}", id);
        }
    }
}

// --- helpers -----------------------------------------------------------------

fn project(
    schemas: &Schemas,
    config: &CliConfig,
    graph: &SemanticGraph,
) -> semantic_graphs::ProjectedSemanticGraph {
    let projector = SemanticGraphProjector::new(&schemas.ontologies).with_taxonomies(&schemas.taxonomies);
    match config.fixed_clock_ms {
        Some(ms) => projector.with_clock(FixedClock(ms)).project(graph),
        None => projector.project(graph),
    }
}

/// Print an integrity report and return the number of problems.
fn report(label: &str, errors: Vec<String>) -> usize {
    if errors.is_empty() {
        println!("{}: ok", label);
    } else {
        println!("{}: {} problem{}", label, errors.len(), if errors.len() == 1 { "" } else { "s" });
        for e in &errors {
            println!("  {}", e);
        }
    }
    errors.len()
}

fn add_schema_files(schemas: &mut Schemas, ontology: Option<&Path>, taxonomy: Option<&Path>) {
    if let Some(path) = ontology {
        add_ontology(schemas, path);
    }
    if let Some(path) = taxonomy {
        add_taxonomy(schemas, path);
    }
}

fn add_taxonomy(schemas: &mut Schemas, path: &Path) -> TaxonomyId {
    let t: Taxonomy = read_entity(path, "taxonomy");
    schemas.taxonomies.register(t).taxonomy_id.clone()
}

fn add_ontology(schemas: &mut Schemas, path: &Path) -> OntologyId {
    let o: Ontology = read_entity(path, "ontology");
    schemas.ontologies.register(o).ontology_id.clone()
}

fn add_rule_set(schemas: &mut Schemas, path: &Path) -> RuleSetId {
    let rs: RuleSet = read_entity(path, "rule set");
    schemas.rule_sets.register(rs).rule_set_id.clone()
}

/// Read and parse one entity, exiting with a message naming `what` on failure.
fn read_entity<E: SchemaEntity>(path: &Path, what: &str) -> E {
    let json = read_input(path);
    let value: Value = serde_json::from_str(&json)
        .unwrap_or_else(|e| fatal(&format!("failed to parse {} as JSON: {}", path.display(), e)));
    E::try_from_json(value)
        .unwrap_or_else(|e| fatal(&format!("failed to parse {} as a {}: {}", path.display(), what, e)))
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &Path) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

fn to_pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fatal(&format!("failed to serialise output: {}", e)))
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("sgraph: {}", msg);
    process::exit(2);
}
