use rendermath::render_math;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let rendered = render_math(r#"\int_{-\infty}^\infty e^{-x^2}\,\mathrm dx"#, ".")?;
    println!("{} ({}px)", rendered.path.display(), rendered.height);
    Ok(())
}
