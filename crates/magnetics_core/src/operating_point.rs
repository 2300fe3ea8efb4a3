//! Operating point bookkeeping across the MAS document and the design state.
//!
//! The circuit-simulator column lists in [`DesignState`] hold one entry per
//! operating point; every function here keeps them the same length as the
//! operating point list it edits.

use log::debug;

use crate::mas::{
    default_excitation, default_excitation_with_harmonics, Excitation, Mas, OperatingPoint,
    Waveform,
};
use crate::stores::{DesignState, OperatingPointsMode};

pub fn operating_point_name(index: usize) -> String {
    format!("Op. Point No. {}", index + 1)
}

/// Makes sure the design has a first operating point with one excitation per
/// winding, adding default excitations for windings that lack one.
pub fn initialize_operating_points(mas: &mut Mas, state: &mut DesignState, temperature: f64) {
    let number_windings = mas.inputs.design_requirements.number_windings();
    let points = &mut mas.inputs.operating_points;
    if points.is_empty() {
        points.push(OperatingPoint::new(operating_point_name(0), temperature));
    }

    let columns = &mut state.operating_points_circuit_simulator;
    if columns.confirmed_columns.len() < points.len() {
        columns.confirmed_columns.resize_with(points.len(), Vec::new);
    }
    if columns.column_names.len() < points.len() {
        columns.column_names.resize_with(points.len(), Vec::new);
    }

    let first = &mut points[0];
    while first.excitations_per_winding.len() < number_windings {
        first.excitations_per_winding.push(default_excitation());
        columns.confirmed_columns[0].push(false);
    }
}

/// Appends a copy of the operating point at `source_index`, returning the
/// index of the new point. In harmonics mode the copy gets fresh
/// harmonics-based excitations for every winding.
pub fn add_operating_point(
    mas: &mut Mas,
    state: &mut DesignState,
    source_index: usize,
    mode: OperatingPointsMode,
) -> Option<usize> {
    let number_windings = mas.inputs.design_requirements.number_windings();
    let points = &mut mas.inputs.operating_points;
    let mut point = points.get(source_index)?.clone();
    point.name = Some(operating_point_name(points.len()));

    if mode == OperatingPointsMode::HarmonicsList {
        point.excitations_per_winding = (0..number_windings)
            .map(|_| default_excitation_with_harmonics())
            .collect();
    }

    let columns = &mut state.operating_points_circuit_simulator;
    columns.confirmed_columns.push(Vec::new());
    columns.column_names.push(Vec::new());
    points.push(point);
    debug!("added operating point {} ({mode:?})", points.len());
    Some(points.len() - 1)
}

/// Removes the operating point at `index` together with its column
/// bookkeeping. Out-of-range indices leave everything untouched.
pub fn remove_operating_point(
    mas: &mut Mas,
    state: &mut DesignState,
    index: usize,
) -> Option<OperatingPoint> {
    if index >= mas.inputs.operating_points.len() {
        return None;
    }
    let columns = &mut state.operating_points_circuit_simulator;
    if index < columns.confirmed_columns.len() {
        columns.confirmed_columns.remove(index);
    }
    if index < columns.column_names.len() {
        columns.column_names.remove(index);
    }
    let removed = mas.inputs.operating_points.remove(index);
    let remaining = mas.inputs.operating_points.len();
    let current = &mut state.current_operating_point;
    if index < *current {
        *current -= 1;
    }
    if *current >= remaining {
        *current = remaining.saturating_sub(1);
    }
    Some(removed)
}

fn waveform_is_complete(waveform: Option<&Waveform>) -> bool {
    let Some(waveform) = waveform else {
        return false;
    };
    let Some(time) = waveform.time.as_ref() else {
        return false;
    };
    !waveform.data.is_empty()
        && time.len() == waveform.data.len()
        && waveform.data.iter().all(|v| v.is_finite())
        && time.iter().all(|t| t.is_finite())
}

/// Whether both voltage and current carry complete sampled waveforms:
/// non-empty, same number of time and data samples, every sample finite.
pub fn power_waveforms_ready(excitation: &Excitation) -> bool {
    let voltage = excitation.voltage.as_ref().and_then(|s| s.waveform.as_ref());
    let current = excitation.current.as_ref().and_then(|s| s.waveform.as_ref());
    waveform_is_complete(voltage) && waveform_is_complete(current)
}
