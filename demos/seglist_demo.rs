use std::io::Read;

use libc::sbrk;
use seglistalloc::Allocator;

/// Waits until the user presses ENTER. Useful when inspecting process
/// memory with `pmap`, `htop`, or `gdb` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  let mut heap = Allocator::new();

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Allocate and write a u64.
    // --------------------------------------------------------------------
    let p1 = heap.malloc(8).expect("malloc(8) failed");
    println!("\n[1] malloc(8) -> {:#x}", p1);
    (p1 as *mut u64).write(0xDEADBEEFDEADBEEF);
    println!("[1] wrote {:#x}", (p1 as *mut u64).read());
    heap.checkheap(line!() as i32);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) A second allocation, served by splitting the remainder of the
    //    first CHUNK-sized free block.
    // --------------------------------------------------------------------
    let p2 = heap.malloc(16).expect("malloc(16) failed");
    println!("\n[2] malloc(16) -> {:#x}", p2);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Free the first block, then allocate something the same size:
    //    the free list should hand the same address back.
    // --------------------------------------------------------------------
    heap.free(Some(p1));
    println!("\n[3] freed {:#x}", p1);
    let p3 = heap.malloc(8).expect("malloc(8) failed");
    println!(
      "[3] malloc(8) -> {:#x} ({})",
      p3,
      if p3 == p1 { "reused the freed block" } else { "allocated elsewhere" }
    );
    heap.checkheap(line!() as i32);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Force heap growth with a large allocation.
    // --------------------------------------------------------------------
    print_program_break("before large alloc");
    let big = heap.malloc(64 * 1024).expect("malloc(64 KiB) failed");
    println!("\n[4] malloc(64 KiB) -> {:#x}", big);
    print_program_break("after large alloc");
    heap.checkheap(line!() as i32);
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) realloc grows the big block in place conceptually (a fresh copy
    //    under the hood) while preserving its contents.
    // --------------------------------------------------------------------
    std::ptr::write_bytes(big as *mut u8, 0xAB, 64 * 1024);
    let grown = heap.realloc(Some(big), 128 * 1024).expect("realloc failed");
    let preserved = (0..64 * 1024).all(|i| (grown as *const u8).add(i).read() == 0xAB);
    println!("\n[5] realloc grew to 128 KiB, contents preserved: {preserved}");

    println!("\n[6] End of demo.");
  }
}
