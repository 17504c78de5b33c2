//! Creates a folder of sample monthly climate files for exercising climfix.
//!
//! Three files are produced in `sample_data/`, one per default variable, with
//! the quirks the normalizer exists to fix: sub-precision coordinate jitter,
//! bounds and height auxiliary variables, mid-month timestamps away from
//! midday, and one file on the noleap model calendar.

use ndarray::{arr0, Array1};
use netcdf::create;
use std::error::Error;
use std::fs;
use std::path::Path;

const MONTHS: usize = 12;
const LATS: usize = 4;
const LONS: usize = 5;

fn main() -> Result<(), Box<dyn Error>> {
    let folder = Path::new("sample_data");
    fs::create_dir_all(folder)?;

    println!("🔨 Creating sample climate files in: {}", folder.display());

    write_variable_file(
        &folder.join("pr_200001-200012.nc"),
        "pr",
        "kg m-2 s-1",
        "precipitation_flux",
        "standard",
        1.5e-5,
        None,
    )?;
    write_variable_file(
        &folder.join("tasmax_200001-200012.nc"),
        "tasmax",
        "K",
        "air_temperature",
        "noleap",
        298.0,
        Some(2.0),
    )?;
    write_variable_file(
        &folder.join("tasmin_200001-200012.nc"),
        "tasmin",
        "K",
        "air_temperature",
        "standard",
        283.0,
        Some(2.0),
    )?;

    println!("✅ Successfully created sample files:");
    println!("   📏 Grid: time({}), lat({}), lon({})", MONTHS, LATS, LONS);
    println!("   📈 Variables: pr (standard calendar), tasmax (noleap), tasmin (standard)");
    println!("   🏷️  Quirks: coordinate jitter, lat/lon bounds, scalar height, off-midday times");
    println!("\n🧪 Normalize the folder with:");
    println!("   cargo run -- -f sample_data");

    Ok(())
}

fn write_variable_file(
    path: &Path,
    var_name: &str,
    units: &str,
    standard_name: &str,
    calendar: &str,
    base_value: f32,
    surface_height: Option<f64>,
) -> Result<(), Box<dyn Error>> {
    // Remove existing file if it exists
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut file = create(path)?;

    // Add global attributes
    file.add_attribute("title", "Synthetic monthly climate data")?;
    file.add_attribute("source", "create_sample_data.rs")?;

    // Add dimensions
    file.add_dimension("time", MONTHS)?;
    file.add_dimension("lat", LATS)?;
    file.add_dimension("lon", LONS)?;
    file.add_dimension("bnds", 2)?;

    // Time axis: mid-month stamps that are deliberately not at midday
    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2000-01-01")?;
        time_var.put_attribute("long_name", "time")?;
        time_var.put_attribute("calendar", calendar)?;

        let time_data: Vec<f64> = (0..MONTHS).map(|i| i as f64 * 30.0 + 14.75).collect();
        time_var.put(Array1::from(time_data).view(), ..)?;
    }

    // Coordinates carry the sub-precision jitter regridding leaves behind
    {
        let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_attribute("long_name", "latitude")?;

        let lat_data: Vec<f64> = (0..LATS).map(|i| 45.0 + i as f64 + 1.2e-6).collect();
        lat_var.put(Array1::from(lat_data).view(), ..)?;

        let mut bnds_var = file.add_variable::<f64>("lat_bnds", &["lat", "bnds"])?;
        let bnds_data: Vec<f64> = (0..LATS)
            .flat_map(|i| {
                let center = 45.0 + i as f64;
                [center - 0.5, center + 0.5]
            })
            .collect();
        bnds_var.put(Array1::from(bnds_data).into_shape((LATS, 2))?.view(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_attribute("long_name", "longitude")?;

        let lon_data: Vec<f64> = (0..LONS).map(|i| 5.0 + i as f64 - 8.0e-7).collect();
        lon_var.put(Array1::from(lon_data).view(), ..)?;

        let mut bnds_var = file.add_variable::<f64>("lon_bnds", &["lon", "bnds"])?;
        let bnds_data: Vec<f64> = (0..LONS)
            .flat_map(|i| {
                let center = 5.0 + i as f64;
                [center - 0.5, center + 0.5]
            })
            .collect();
        bnds_var.put(Array1::from(bnds_data).into_shape((LONS, 2))?.view(), ..)?;
    }

    // Scalar measurement height for the near-surface temperature variables
    if let Some(height) = surface_height {
        let mut height_var = file.add_variable::<f64>("height", &[])?;
        height_var.put_attribute("units", "m")?;
        height_var.put_attribute("long_name", "height above the surface")?;
        height_var.put(arr0(height).view(), &[] as &[usize])?;
    }

    // Data variable: base value with a seasonal cycle and a weak spatial
    // gradient
    {
        let mut var = file.add_variable::<f32>(var_name, &["time", "lat", "lon"])?;
        var.put_attribute("units", units)?;
        var.put_attribute("standard_name", standard_name)?;
        var.put_attribute("long_name", var_name)?;
        var.put_attribute("_FillValue", 1.0e20f32)?;

        let mut data = Vec::with_capacity(MONTHS * LATS * LONS);
        for month in 0..MONTHS {
            let seasonal = (month as f32 * std::f32::consts::PI / 6.0).sin();
            for lat_idx in 0..LATS {
                for lon_idx in 0..LONS {
                    let cell = (lat_idx * LONS + lon_idx) as f32;
                    data.push(base_value * (1.0 + 0.05 * seasonal + 1.0e-3 * cell));
                }
            }
        }
        let array = Array1::from(data).into_shape((MONTHS, LATS, LONS))?;
        var.put(array.view(), ..)?;
    }

    Ok(())
}
