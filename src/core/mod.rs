// ─── ModBox Core ───
// Dependency resolution and packwiz manifest management for modpacks
// stored in a Git repository.
//
// Architecture:
//   core/
//     registry/  : RegistryClient trait + Modrinth v2 adapter
//     resolver/  : Breadth-first dependency resolution
//     manifest/  : pack.toml / index.toml / mods/*.toml and their hash chain
//     store/     : ManifestStore trait, GitHub and in-memory adapters
//     commit.rs  : Conditional commit batches
//     modpack/   : add / remove / list / initialize
//     loaders/   : Fabric, Quilt, NeoForge version lists
//     maven/     : maven-metadata.xml parsing
//     state/     : Settings + application wiring

pub mod commit;
pub mod error;
pub mod hashing;
pub mod http;
pub mod loaders;
pub mod manifest;
pub mod maven;
pub mod modpack;
pub mod registry;
pub mod resolver;
pub mod state;
pub mod store;
