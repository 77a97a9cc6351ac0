use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            nbt_flavors_fuzz::test(data);
        });
    }
}
