//! Whitespace separated text tables, one row per line with six decimals.
use crate::error::Result;
use ndarray::prelude::*;
use ndarray::Data;
use num_traits::Float;
use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn push_value<T: Float + Display>(s0: &mut String, x: T) {
    // one column less of padding for the minus sign
    if x >= T::zero() {
        s0.push_str("     ");
    } else {
        s0.push_str("    ");
    }
    s0.push_str(&format!("{:.6}", x));
}

pub fn format_table<T, S>(data: &ArrayBase<S, Ix2>) -> String
where
    T: Float + Display,
    S: Data<Elem = T>,
{
    let mut s0 = String::new();
    for row in data.outer_iter() {
        for x in row.iter() {
            push_value(&mut s0, *x);
        }
        s0.push('\n');
    }
    s0
}

pub fn write_txt<T, S, P>(data: &ArrayBase<S, Ix2>, output: P) -> Result<()>
where
    T: Float + Display,
    S: Data<Elem = T>,
    P: AsRef<Path>,
{
    let mut file = File::create(output)?;
    write!(file, "{}", format_table(data))?;
    Ok(())
}

/// One value per line.
pub fn write_txt_1<T, S, P>(data: &ArrayBase<S, Ix1>, output: P) -> Result<()>
where
    T: Float + Display,
    S: Data<Elem = T>,
    P: AsRef<Path>,
{
    let column = data.to_owned().insert_axis(Axis(1));
    write_txt(&column, output)
}
