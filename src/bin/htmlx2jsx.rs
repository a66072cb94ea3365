// Command-line front end: `htmlx2jsx transform|ast|diff|batch`.

fn main() {
    htmlx2jsx::cli::run();
}
