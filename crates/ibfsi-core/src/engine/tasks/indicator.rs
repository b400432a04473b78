use crate::core::fe_values::quadrature_points;
use crate::core::fields::CellProperties;
use crate::core::geometry::locator::{LocatorStrategy, PointLocator};
use crate::core::models::ids::ElementId;
use crate::core::models::mesh::{Mesh, MeshError};
use crate::core::quadrature::QuadratureFormula;
use crate::engine::error::EngineError;
use crate::engine::motion::DisplacedMesh;
use crate::solvers::{FluidSolver, SolidSolver};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Immersed / pure-fluid classification of every fluid element, in arena order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    entries: Vec<(ElementId, bool)>,
}

impl Indicator {
    pub fn is_immersed(&self, element: ElementId) -> bool {
        self.entries
            .iter()
            .any(|&(id, immersed)| id == element && immersed)
    }

    pub fn immersed(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.entries
            .iter()
            .filter(|(_, immersed)| *immersed)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn n_immersed(&self) -> usize {
        self.entries.iter().filter(|(_, immersed)| *immersed).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the classification into the fluid cell properties.
    pub fn assign_to(&self, cells: &mut CellProperties) -> Result<(), MeshError> {
        for &(id, immersed) in &self.entries {
            cells.set_indicator(id, immersed)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSummary {
    pub immersed: usize,
    pub total: usize,
}

/// Classifies each fluid element against a solid mesh in its current shape.
///
/// An element is immersed iff every one of its volume quadrature points lies
/// inside the solid; the first point outside settles the element.
pub fn classify(
    fluid_mesh: &Mesh,
    quadrature: &QuadratureFormula,
    solid_mesh: &Mesh,
    strategy: LocatorStrategy,
) -> Result<Indicator, MeshError> {
    let locator = PointLocator::new(solid_mesh, strategy)?;
    let elements: Vec<ElementId> = fluid_mesh.element_ids().collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = elements.iter();

    #[cfg(feature = "parallel")]
    let iterator = elements.par_iter();

    let entries = iterator
        .map(|&id| {
            let points = quadrature_points(fluid_mesh, id, quadrature)?;
            Ok((id, points.iter().all(|q| locator.contains(q))))
        })
        .collect::<Result<Vec<_>, MeshError>>()?;

    Ok(Indicator { entries })
}

/// Recomputes the fluid indicator against the displaced solid and assigns it.
///
/// The solid mesh is displaced for the duration of the classification and is
/// restored before this returns, whether or not classification succeeds.
#[instrument(skip_all, name = "indicator_task")]
pub fn update<F, S>(
    fluid: &mut F,
    solid: &mut S,
    strategy: LocatorStrategy,
) -> Result<IndicatorSummary, EngineError>
where
    F: FluidSolver + ?Sized,
    S: SolidSolver + ?Sized,
{
    let indicator = {
        let state = solid.state_mut();
        let displaced = DisplacedMesh::new(state.mesh, state.displacement)?;
        classify(
            fluid.mesh(),
            fluid.volume_quadrature(),
            displaced.mesh(),
            strategy,
        )?
    };
    indicator.assign_to(fluid.cell_properties_mut())?;

    let summary = IndicatorSummary {
        immersed: indicator.n_immersed(),
        total: indicator.len(),
    };
    debug!(
        immersed = summary.immersed,
        total = summary.total,
        "Updated fluid indicator."
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::locator::contains;
    use crate::core::models::builder::MeshBuilder;
    use nalgebra::Point2;

    fn fluid_grid() -> Mesh {
        MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [4, 4]).unwrap()
    }

    #[test]
    fn immersed_elements_have_every_quadrature_point_inside() {
        let fluid = fluid_grid();
        let solid = MeshBuilder::disk(Point2::new(0.5, 0.5), 0.3, 24, 3).unwrap();
        let quadrature = QuadratureFormula::gauss(2).unwrap();
        let indicator = classify(&fluid, &quadrature, &solid, LocatorStrategy::KdTree).unwrap();

        assert_eq!(indicator.len(), 16);
        for (id, immersed) in indicator.iter() {
            let points = quadrature_points(&fluid, id, &quadrature).unwrap();
            let all_inside = points.iter().all(|q| contains(&solid, q));
            assert_eq!(immersed, all_inside);
        }
        // The four central elements lie within the disk, the corners do not.
        assert_eq!(indicator.n_immersed(), 4);
    }

    #[test]
    fn one_point_outside_disqualifies_element() {
        let fluid = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), [1, 1])
            .unwrap();
        // Covers only the left column of the 2x2 Gauss points.
        let solid = MeshBuilder::rectangle(Point2::new(0.0, 0.0), Point2::new(0.7, 1.0), [1, 1])
            .unwrap();
        let quadrature = QuadratureFormula::gauss(2).unwrap();
        let indicator = classify(&fluid, &quadrature, &solid, LocatorStrategy::Linear).unwrap();
        assert_eq!(indicator.n_immersed(), 0);
    }

    #[test]
    fn linear_and_kd_tree_classification_agree() {
        let fluid = fluid_grid();
        let solid = MeshBuilder::disk(Point2::new(0.4, 0.55), 0.33, 16, 2).unwrap();
        let quadrature = QuadratureFormula::gauss(3).unwrap();
        let a = classify(&fluid, &quadrature, &solid, LocatorStrategy::Linear).unwrap();
        let b = classify(&fluid, &quadrature, &solid, LocatorStrategy::KdTree).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn assign_to_overwrites_previous_values() {
        let fluid = fluid_grid();
        let mut cells = CellProperties::uniform(&fluid, 1.0);
        for id in fluid.element_ids() {
            cells.set_indicator(id, true).unwrap();
        }
        let far_away = MeshBuilder::disk(Point2::new(5.0, 5.0), 0.1, 8, 1).unwrap();
        let quadrature = QuadratureFormula::gauss(1).unwrap();
        let indicator = classify(&fluid, &quadrature, &far_away, LocatorStrategy::KdTree).unwrap();
        indicator.assign_to(&mut cells).unwrap();
        assert_eq!(cells.n_immersed(), 0);
    }
}
