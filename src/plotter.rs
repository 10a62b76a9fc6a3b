//! Plotting pipeline
//!
//! clear → bounds → scale → grid → (record, drawable check, draw) per object.
//! Objects outside the drawable box are left out of the bounds so one stray
//! catalog entry cannot squash the rest of the plot.

use serde::Serialize;

use crate::config::StarSettings;
use crate::events::{Event, EventQueue};
use crate::model::{CatalogObject, StarDisplayRecord, Vec3};
use crate::registry::PlotRegistry;
use crate::renderer::{Layer, Renderer};
use crate::stellar::StellarCatalog;
use crate::transform::{CoordinateTransformer, ScalingParameters};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotSummary {
    pub plotted: usize,
    pub rejected: usize,
    pub center: Vec3,
    pub scale_increment: f64,
    pub grid_scale: f64,
    pub scale_factor: f64,
}

impl PlotSummary {
    fn new(center: Vec3, scaling: ScalingParameters) -> Self {
        Self {
            plotted: 0,
            rejected: 0,
            center,
            scale_increment: scaling.scale_increment,
            grid_scale: scaling.grid_scale,
            scale_factor: scaling.scale_factor,
        }
    }
}

/// Everything a plot pass touches
pub struct PlotTarget<'a, R: Renderer> {
    pub transformer: &'a mut CoordinateTransformer,
    pub registry: &'a mut PlotRegistry,
    pub renderer: &'a mut R,
    pub events: &'a mut EventQueue,
}

#[derive(Debug, Clone)]
pub struct Plotter {
    stellar: StellarCatalog,
    stars: StarSettings,
}

impl Plotter {
    pub fn new(stellar: StellarCatalog, stars: StarSettings) -> Self {
        Self { stellar, stars }
    }

    pub fn stellar(&self) -> &StellarCatalog {
        &self.stellar
    }

    /// Replace the whole plot with `objects` centered on `center`
    pub fn plot<R: Renderer>(
        &self,
        objects: &[CatalogObject],
        center: Vec3,
        center_name: Option<&str>,
        target: PlotTarget<'_, R>,
    ) -> PlotSummary {
        let PlotTarget {
            transformer,
            registry,
            renderer,
            events,
        } = target;

        renderer.clear_stars();
        registry.clear();
        registry.clear_rejections();
        events.push(Event::ListCleared);

        let drawable: Vec<Vec3> = objects
            .iter()
            .map(|o| o.coordinates)
            .filter(|&p| registry.drawable().contains(p))
            .collect();
        let bounds = transformer.compute_bounds(&drawable, center);
        let scaling = transformer.choose_scale(&bounds);
        renderer.rebuild_grid(scaling.scale_increment, scaling.grid_scale);

        let mut summary = PlotSummary::new(center, scaling);
        for object in objects {
            let record = self.display_record(object, transformer);
            match registry.upsert(record.clone()) {
                Ok(()) => {
                    let handle = renderer.draw_star(&record, center_name);
                    registry.attach_handle(&record.id, handle);
                    events.push(Event::ListChanged(record));
                    summary.plotted += 1;
                }
                Err(_) => summary.rejected += 1,
            }
        }
        renderer.raise_to_front(Layer::Labels);

        tracing::info!(
            "Plotted {} stars ({} not drawable), grid every {}ly",
            summary.plotted,
            summary.rejected,
            summary.scale_increment
        );
        summary
    }

    /// Display record of a catalog object under the current transform
    pub fn display_record(&self, object: &CatalogObject, transformer: &CoordinateTransformer) -> StarDisplayRecord {
        let color = object
            .color
            .or_else(|| {
                object
                    .spectral_class
                    .as_deref()
                    .and_then(|class| self.stellar.color_for(class))
            })
            .unwrap_or(self.stars.default_color);

        StarDisplayRecord {
            id: object.id.clone(),
            name: object.name.clone(),
            actual_coordinates: object.coordinates,
            coordinates: transformer.transform(object.coordinates),
            radius: object.radius.unwrap_or(self.stars.default_radius) * self.stars.radius_scale,
            color,
            group: object.group.clone(),
            notes: object.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DrawableBounds, GridSettings};
    use crate::model::StarId;
    use crate::renderer::RecordingRenderer;

    fn object(id: &str, at: Vec3, class: Option<&str>) -> CatalogObject {
        CatalogObject {
            id: StarId::from(id),
            name: id.to_uppercase(),
            coordinates: at,
            radius: None,
            spectral_class: class.map(str::to_string),
            color: None,
            group: None,
            notes: String::new(),
        }
    }

    struct Fixture {
        transformer: CoordinateTransformer,
        registry: PlotRegistry,
        renderer: RecordingRenderer,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                transformer: CoordinateTransformer::new(GridSettings::default()),
                registry: PlotRegistry::new(DrawableBounds {
                    min: [-20.0; 3],
                    max: [20.0; 3],
                }),
                renderer: RecordingRenderer::default(),
                events: EventQueue::new(),
            }
        }

        fn target(&mut self) -> PlotTarget<'_, RecordingRenderer> {
            PlotTarget {
                transformer: &mut self.transformer,
                registry: &mut self.registry,
                renderer: &mut self.renderer,
                events: &mut self.events,
            }
        }
    }

    fn plotter() -> Plotter {
        Plotter::new(StellarCatalog::standard(), StarSettings::default())
    }

    #[test]
    fn test_plot_pipeline() {
        let mut fx = Fixture::new();
        let objects = vec![
            object("sol", [0.0, 0.0, 0.0], Some("G2V")),
            object("acen", [4.0, 0.0, 0.0], None),
            object("far", [500.0, 0.0, 0.0], Some("O5")),
        ];

        let summary = plotter().plot(&objects, [0.0; 3], Some("SOL"), fx.target());

        assert_eq!(summary.plotted, 2);
        assert_eq!(summary.rejected, 1);
        // the rejected star does not widen the scale
        assert_eq!(summary.scale_factor, 25.0);
        assert_eq!(fx.renderer.grid, Some((1.0, 25.0)));
        assert_eq!(fx.registry.len(), 2);
        assert_eq!(fx.registry.rejections().len(), 1);
        assert_eq!(fx.renderer.stars.len(), 2);
        assert!(fx.renderer.stars[0].central);
        assert!(!fx.renderer.stars[1].central);
        assert_eq!(fx.registry.handle(&StarId::from("acen")), Some(fx.renderer.stars[1].handle));

        let events = fx.events.drain();
        assert_eq!(events[0], Event::ListCleared);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_record_color_and_radius() {
        let fx = Fixture::new();
        let p = plotter();
        let mut sol = object("sol", [0.0; 3], Some("G2V"));
        sol.radius = Some(2.0);
        let record = p.display_record(&sol, &fx.transformer);
        assert_eq!(record.radius, 6.0);
        assert_eq!(record.color, p.stellar().color_for("G").unwrap());

        let unknown = p.display_record(&object("x", [0.0; 3], None), &fx.transformer);
        assert_eq!(unknown.color, StarSettings::default().default_color);
        assert_eq!(unknown.radius, 3.0);

        let mut painted = object("p", [0.0; 3], Some("M4"));
        painted.color = Some([0.1, 0.2, 0.3]);
        assert_eq!(p.display_record(&painted, &fx.transformer).color, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_replot_clears_previous_stars() {
        let mut fx = Fixture::new();
        let p = plotter();
        p.plot(&[object("a", [1.0; 3], None)], [0.0; 3], None, fx.target());
        p.plot(&[object("b", [2.0; 3], None)], [0.0; 3], None, fx.target());

        assert_eq!(fx.renderer.star_clears, 2);
        assert_eq!(fx.renderer.stars.len(), 1);
        assert!(fx.registry.find(&StarId::from("a")).is_none());
        assert!(fx.registry.find(&StarId::from("b")).is_some());
    }

    #[test]
    fn test_plot_recenters_coordinates() {
        let mut fx = Fixture::new();
        let objects = vec![object("a", [10.0, 0.0, 0.0], None), object("b", [12.0, 0.0, 0.0], None)];
        plotter().plot(&objects, [10.0, 0.0, 0.0], Some("A"), fx.target());

        let a = fx.registry.find(&StarId::from("a")).unwrap();
        let b = fx.registry.find(&StarId::from("b")).unwrap();
        assert_eq!(a.coordinates, [0.0; 3]);
        assert_eq!(b.coordinates, [100.0, 0.0, 0.0]);
        assert_eq!(b.actual_coordinates, [12.0, 0.0, 0.0]);
    }
}
