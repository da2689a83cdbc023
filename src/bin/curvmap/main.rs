//! curvmap CLI - curvature analysis of procedural meshes.
//!
//! Usage: curvmap <COMMAND> [OPTIONS]
//!
//! Run `curvmap --help` for available commands. Set `RUST_LOG=debug` for
//! build and timing details.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use curvmap::algo::analysis::{
    robust_range, vertex_curvatures, AnalysisOptions, CurvatureKind, FieldStats, TopologySummary,
};
use curvmap::algo::spherical::{vertex_gauss_map, GaussMapOptions};
use curvmap::algo::subdivide::{loop_subdivide_with_progress, SubdivideOptions};
use curvmap::algo::tensor::TensorSmoothing;
use curvmap::algo::Progress;
use curvmap::mesh::{primitives, Mesh, VertexId};

#[derive(Parser)]
#[command(name = "curvmap")]
#[command(author, version, about = "Discrete curvature analysis CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh topology and global deficits
    Info {
        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Compute per-vertex curvature and print statistics
    Analyze {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Curvature kind (all kinds if omitted)
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Print every vertex value
        #[arg(long)]
        values: bool,

        /// Tensor smoothing iterations (principal kinds only)
        #[arg(long, default_value = "0")]
        smooth_iterations: usize,

        /// Tensor smoothing time step (0.0 to 1.0)
        #[arg(long, default_value = "0.5")]
        time_step: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Print the Gauss-map polyline of a vertex star
    GaussMap {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Vertex index
        #[arg(long, default_value = "0")]
        vertex: usize,

        /// Points per great-circle arc
        #[arg(long, default_value = "16")]
        samples: usize,

        /// Sphere radius
        #[arg(long, default_value = "1.0")]
        radius: f64,
    },
}

#[derive(Args)]
struct ShapeArgs {
    /// Procedural shape to analyze
    #[arg(short, long, value_enum, default_value = "icosphere")]
    shape: Shape,

    /// Shape resolution (icosphere level, grid cells per side, torus segments)
    #[arg(short, long, default_value = "2")]
    resolution: usize,

    /// Loop subdivision iterations applied before analysis
    #[arg(long, default_value = "0")]
    subdivide: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Shape {
    /// Regular tetrahedron
    Tetrahedron,
    /// Regular octahedron
    Octahedron,
    /// Regular icosahedron
    Icosahedron,
    /// Unit sphere from a split icosahedron
    Icosphere,
    /// Flat square grid
    Grid,
    /// Saddle height field z = x² - y²
    Saddle,
    /// Torus with radii 2 and 0.5
    Torus,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Horizon measure
    Horizon,
    /// Triangle horizon measure
    TriangleHorizon,
    /// Unsigned mean curvature
    Mean,
    /// Signed mean curvature
    MeanSigned,
    /// Gaussian curvature
    Gaussian,
    /// Raw angle defect
    AngleDefect,
    /// Unsigned distortion
    Distortion,
    /// Signed distortion
    DistortionSigned,
    /// Cone curvature
    Cone,
    /// Max principal distortion
    MaxDistortion,
    /// Min principal distortion
    MinDistortion,
    /// False Gaussian curvature
    FalseGaussian,
    /// False mean curvature
    FalseMean,
    /// Principal deviation
    PrincipalDeviation,
    /// Max principal curvature (tensor fit)
    PrincipalMax,
    /// Min principal curvature (tensor fit)
    PrincipalMin,
}

impl From<KindArg> for CurvatureKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Horizon => CurvatureKind::Horizon,
            KindArg::TriangleHorizon => CurvatureKind::TriangleHorizon,
            KindArg::Mean => CurvatureKind::Mean,
            KindArg::MeanSigned => CurvatureKind::MeanSigned,
            KindArg::Gaussian => CurvatureKind::Gaussian,
            KindArg::AngleDefect => CurvatureKind::AngleDefect,
            KindArg::Distortion => CurvatureKind::Distortion,
            KindArg::DistortionSigned => CurvatureKind::DistortionSigned,
            KindArg::Cone => CurvatureKind::Cone,
            KindArg::MaxDistortion => CurvatureKind::MaxPrincipalDistortion,
            KindArg::MinDistortion => CurvatureKind::MinPrincipalDistortion,
            KindArg::FalseGaussian => CurvatureKind::FalseGaussian,
            KindArg::FalseMean => CurvatureKind::FalseMean,
            KindArg::PrincipalDeviation => CurvatureKind::PrincipalDeviation,
            KindArg::PrincipalMax => CurvatureKind::PrincipalMax,
            KindArg::PrincipalMin => CurvatureKind::PrincipalMin,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { shape } => {
            cmd_info(&shape)?;
        }

        Commands::Analyze {
            shape,
            kind,
            values,
            smooth_iterations,
            time_step,
            sequential,
        } => {
            let smoothing = TensorSmoothing::default()
                .with_iterations(smooth_iterations)
                .with_time_step(time_step);
            let options = AnalysisOptions::default()
                .with_parallel(!sequential)
                .with_smoothing(smoothing);
            cmd_analyze(&shape, kind.map(CurvatureKind::from), values, &options)?;
        }

        Commands::GaussMap {
            shape,
            vertex,
            samples,
            radius,
        } => {
            let options = GaussMapOptions::default()
                .with_samples_per_arc(samples)
                .with_radius(radius);
            cmd_gauss_map(&shape, vertex, &options)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only redraw when the bar advances.
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent <= previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

/// Build the requested shape and subdivide it.
fn load_shape(args: &ShapeArgs) -> Result<Mesh, Box<dyn std::error::Error>> {
    let n = args.resolution;
    let mesh = match args.shape {
        Shape::Tetrahedron => primitives::tetrahedron()?,
        Shape::Octahedron => primitives::octahedron()?,
        Shape::Icosahedron => primitives::icosahedron()?,
        Shape::Icosphere => primitives::icosphere(n)?,
        Shape::Grid => primitives::grid(n, 1.0)?,
        Shape::Saddle => primitives::height_field(n, 1.0, |x, y| x * x - y * y)?,
        Shape::Torus => primitives::torus(2.0, 0.5, 8 * n.max(2), 4 * n.max(2))?,
    };

    if args.subdivide == 0 {
        return Ok(mesh);
    }

    let start = Instant::now();
    let options = SubdivideOptions::new(args.subdivide);
    let mesh = loop_subdivide_with_progress(&mesh, &options, &create_progress())?;
    println!(
        "Subdivided {} times: {} vertices, {} triangles ({:.2?})",
        args.subdivide,
        mesh.num_vertices(),
        mesh.num_triangles(),
        start.elapsed()
    );
    Ok(mesh)
}

fn cmd_info(shape: &ShapeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_shape(shape)?;
    let summary = TopologySummary::of(&mesh);

    println!("Vertices: {}", summary.vertices);
    println!("Edges: {}", summary.edges);
    println!("Triangles: {}", summary.triangles);
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    if summary.boundary_vertices == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", summary.boundary_vertices);
    }

    println!("Euler characteristic: {}", summary.euler_characteristic);
    println!(
        "Total angle deficit: {:.6} ({:.4} x 2π)",
        summary.angle_deficit,
        summary.angle_deficit / std::f64::consts::TAU
    );
    println!("Valence deficit: {}", summary.valence_deficit);

    Ok(())
}

fn cmd_analyze(
    shape: &ShapeArgs,
    kind: Option<CurvatureKind>,
    show_values: bool,
    options: &AnalysisOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_shape(shape)?;
    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Analyzing {} vertices, {} triangles ({})",
        mesh.num_vertices(),
        mesh.num_triangles(),
        mode
    );

    let kinds: Vec<CurvatureKind> = match kind {
        Some(kind) => vec![kind],
        None => CurvatureKind::ALL.to_vec(),
    };

    for kind in kinds {
        let start = Instant::now();
        let values = vertex_curvatures(&mesh, kind, options)?;
        let elapsed = start.elapsed();

        println!("\n{}:", kind);
        match FieldStats::from_values(&values) {
            Some(stats) => {
                let (low, high) = robust_range(&values);
                println!(
                    "  min={:.6}, max={:.6}, mean={:.6}, std={:.6}",
                    stats.min, stats.max, stats.mean, stats.std_dev
                );
                println!("  5%-95% range: [{:.6}, {:.6}] ({:.2?})", low, high, elapsed);
            }
            None => println!("  no values"),
        }

        if show_values {
            for (i, value) in values.iter().enumerate() {
                println!("  {}\t{:.9}", i, value);
            }
        }
    }

    Ok(())
}

fn cmd_gauss_map(
    shape: &ShapeArgs,
    vertex: usize,
    options: &GaussMapOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_shape(shape)?;
    if vertex >= mesh.num_vertices() {
        return Err(format!(
            "vertex {} out of range ({} vertices)",
            vertex,
            mesh.num_vertices()
        )
        .into());
    }

    let v = VertexId::new(vertex);
    let polyline = vertex_gauss_map(&mesh, v, options)?;
    println!(
        "Gauss map of vertex {} ({} triangles, {} points):",
        vertex,
        mesh.star(v).len(),
        polyline.len()
    );
    for p in &polyline {
        println!("{:.9} {:.9} {:.9}", p.x, p.y, p.z);
    }

    Ok(())
}
