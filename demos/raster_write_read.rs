use std::sync::Arc;

use rasterstore::{
    array::{Array, Context, Mode, Subarray},
    raster::{store_raster_array_with, PIXEL_ATTRIBUTE, X_DIMENSION, Y_DIMENSION},
    storage::{
        storage_adapter::usage_log::UsageLogStorageAdapter, store::FilesystemStore,
        ReadableWritableListableStorage,
    },
};

fn raster_write_read() -> Result<(), Box<dyn std::error::Error>> {
    // Create a store
    let path = tempfile::TempDir::new()?;
    let mut store: ReadableWritableListableStorage =
        Arc::new(FilesystemStore::new(path.path())?);
    if let Some(arg1) = std::env::args().collect::<Vec<_>>().get(1) {
        if arg1 == "--usage-log" {
            let log_writer = Arc::new(parking_lot::Mutex::new(std::io::stdout()));
            store = Arc::new(UsageLogStorageAdapter::new(store, log_writer, || {
                chrono::Utc::now().format("[%T%.3f] ").to_string()
            }));
        }
    }
    let context = Context::new(store);

    // Store a 6x4 raster with a diagonal gradient
    let (width, height) = (6i64, 4i64);
    let pixels: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| u8::try_from(x + y * 10).unwrap_or(u8::MAX)))
        .collect();
    let array_path = "/dem";
    store_raster_array_with(&context, array_path, width, height, &pixels)?;

    let array = Array::open(&context, array_path, Mode::Read)?;
    println!(
        "The array schema is:\n{}\n",
        serde_json::to_string_pretty(array.schema())?
    );
    println!("The write count is {}\n", array.write_count()?);

    // Read the whole raster
    let data_all = array.retrieve_subarray(PIXEL_ATTRIBUTE, &Subarray::new())?;
    println!("The whole raster is:");
    for row in data_all.chunks(usize::try_from(width)?) {
        println!("{row:?}");
    }

    // Read the centre 2x2 region
    let subarray = Subarray::new()
        .add_range(Y_DIMENSION, [1, 2])
        .add_range(X_DIMENSION, [2, 3]);
    let data_2x2 = array.retrieve_subarray(PIXEL_ATTRIBUTE, &subarray)?;
    println!("\nThe middle 2x2 region is:\n{data_2x2:?}");

    array.close();
    println!("\nOpen handles after close: {}", context.total_open_handles());
    Ok(())
}

fn main() {
    if let Err(err) = raster_write_read() {
        println!("{}", err);
    }
}
