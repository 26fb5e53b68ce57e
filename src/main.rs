use clap::Parser;
use viz_engine::config::EngineOptions;

#[derive(Parser, Debug)]
#[command(name = "viz-demo")]
#[command(about = "Pan, zoom and select in a generated node-link graph")]
struct Args {
    /// Never draw with instancing
    #[arg(long)]
    disable_instanced_drawing: bool,

    /// Never draw through indirect command buffers
    #[arg(long)]
    disable_indirect_drawing: bool,

    /// Never draw CPU-expanded vertex arrays
    #[arg(long = "disable-vao")]
    disable_vertex_arrays: bool,

    /// Request a validating GPU context
    #[arg(long)]
    debug: bool,

    /// Select only the picked node and its edges, not its neighbours
    #[arg(long)]
    no_auto_select_neighbours: bool,

    /// Do not draw edges
    #[arg(long)]
    hide_edges: bool,
}

impl Args {
    fn into_options(self) -> EngineOptions {
        EngineOptions::builder()
            .disable_instanced_drawing(self.disable_instanced_drawing)
            .disable_indirect_drawing(self.disable_indirect_drawing)
            .disable_vertex_arrays(self.disable_vertex_arrays)
            .debug_context(self.debug)
            .auto_select_neighbours(!self.no_auto_select_neighbours)
            .show_edges(!self.hide_edges)
            .build()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = Args::parse().into_options();
    log::debug!("Starting with {options:?}");
    viz_engine::run(options)
}
