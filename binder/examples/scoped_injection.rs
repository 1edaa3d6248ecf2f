use fibre_binder::{
  global_registry, implements, inject, Container, Id, InjectionContext, Injectable, Result,
};
use std::sync::{Arc, Mutex};

trait Renderer: Send + Sync {
  fn draw(&self, what: &str) -> String;
}

#[derive(Default)]
struct PixelRenderer;

impl Renderer for PixelRenderer {
  fn draw(&self, what: &str) -> String {
    format!("[pixels] {}", what)
  }
}

#[derive(Default)]
struct TextRenderer;

impl Renderer for TextRenderer {
  fn draw(&self, what: &str) -> String {
    format!("[text] {}", what)
  }
}

implements!(PixelRenderer => dyn Renderer);
implements!(TextRenderer => dyn Renderer);

struct HealthBar;

#[derive(Default)]
struct Hud {
  renderer: Mutex<Option<Arc<dyn Renderer>>>,
}

impl Injectable for Hud {
  fn inject(&self, container: &Container, ctx: &InjectionContext) -> Result<()> {
    let renderer = container.resolve::<dyn Renderer>(None, ctx)?;
    *self.renderer.lock().unwrap() = Some(renderer);
    Ok(())
  }

  fn target_containers(&self) -> Vec<Id> {
    vec![Id::from("ui")]
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fibre_binder=debug")),
    )
    .init();

  // One container for the HUD, one for the world.
  let ui = Container::with_id("ui");
  let world = Container::with_id("world");
  for container in [&ui, &world] {
    let factories = container.factories().expect("default registry");
    factories.register_default::<PixelRenderer>();
    factories.register_default::<TextRenderer>();
  }

  // The HUD gets the text renderer; everything else draws pixels.
  ui.bind_singleton::<dyn Renderer>()
    .to::<TextRenderer>()?
    .into_type::<Hud>();
  ui.bind_singleton::<dyn Renderer>().to::<PixelRenderer>()?;
  world.bind_singleton::<dyn Renderer>().to::<PixelRenderer>()?;

  global_registry().register(ui.clone());
  global_registry().register(world.clone());

  // Routed only to "ui", as declared by `target_containers`.
  let hud = Arc::new(Hud::default());
  let injected = inject(global_registry(), &hud)?;
  println!("HUD injected by {} container(s)", injected);

  if let Some(renderer) = hud.renderer.lock().unwrap().as_ref() {
    println!("{}", renderer.draw("HP 100/100"));
  }

  let ctx = InjectionContext::new().with_parent_type::<HealthBar>();
  let other = ui.resolve::<dyn Renderer>(None, &ctx)?;
  println!("{}", other.draw("health bar"));

  global_registry().clear();
  Ok(())
}
