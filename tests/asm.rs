// Accumulator virtual machine: interpreter for label-assembled programs.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use accvm::{
    AsmError, CoreConfig, ExecState, Fault, Instr, Label, Program, ResolutionError, StdHost, Trap, Vm, RODATA_BASE,
};

const FIBONACCI: &str = include_str!("../demos/fibonacci.asm");
const SPRINTF: &str = include_str!("../demos/sprintf.asm");
const HELLO_WORLD: &str = include_str!("../demos/hello_world.asm");
const FUNCTION: &str = include_str!("../demos/function.asm");
const LOOP: &str = include_str!("../demos/loop.asm");

fn exec(program: &Program, config: CoreConfig) -> (Result<(), Trap>, String) {
    let mut vm = Vm::with(program, config, StdHost::new(Vec::<u8>::new()));
    let res = vm.run();
    let out = String::from_utf8(vm.into_host().into_inner()).unwrap();
    (res, out)
}

fn run(source: &str) -> (Result<(), Trap>, String) {
    let program = Program::assemble(source).unwrap();
    exec(&program, CoreConfig::default())
}

fn run_ok(source: &str, expected: &str) {
    let (res, out) = run(source);
    assert_eq!(res, Ok(()));
    assert_eq!(out, expected);
}

fn run_fault(source: &str, fault: Fault) -> Trap {
    let (res, _) = run(source);
    let trap = res.unwrap_err();
    assert_eq!(trap.fault, fault);
    trap
}

#[test]
fn fibonacci() { run_ok(FIBONACCI, "987\n"); }

#[test]
fn sprintf() { run_ok(SPRINTF, "Hello world: 123456789!\n"); }

#[test]
fn hello_world() { run_ok(HELLO_WORLD, "Hello world!\n"); }

#[test]
fn function() { run_ok(FUNCTION, &"Hello world!\n".repeat(5)); }

#[test]
fn countdown() { run_ok(LOOP, "54321\n"); }

#[test]
fn runs_are_independent() {
    let program = Program::assemble(SPRINTF).unwrap();
    let first = exec(&program, CoreConfig::default());
    let second = exec(&program, CoreConfig::default());
    assert_eq!(first, second);
    assert_eq!(first.1, "Hello world: 123456789!\n");
}

#[test]
fn binary_image() {
    let program = Program::assemble(FIBONACCI).unwrap();
    let loaded = Program::from_image(program.to_image()).unwrap();
    assert_eq!(exec(&loaded, CoreConfig::default()), (Ok(()), s("987\n")));
}

#[test]
fn fibonacci_small_stack() {
    let program = Program::assemble(FIBONACCI).unwrap();
    let config = CoreConfig { call_stack_max: Some(8), ..CoreConfig::default() };
    let (res, out) = exec(&program, config);
    assert_eq!(res.unwrap_err().fault, Fault::StackOverflow(8));
    assert!(out.is_empty());
}

#[test]
fn step_limit() {
    let program = Program::assemble(LOOP).unwrap();
    let config = CoreConfig { step_limit: Some(4), ..CoreConfig::default() };
    let (res, out) = exec(&program, config);
    assert_eq!(res, Err(Trap { pos: 1, fault: Fault::StepLimit(4) }));
    assert_eq!(out, "5");
}

#[test]
fn unbalanced_return() {
    let trap = run_fault(
        "jump main\n\
         label broken\n\
         pop\n\
         return\n\
         label main\n\
         call broken\n\
         halt\n",
        Fault::StackUnderflow,
    );
    assert_eq!(trap.pos, 2);
}

#[test]
fn push_pop_lifo() {
    run_ok(
        "setRegister 2 7\n\
         set 1\n\
         push\n\
         pushRegister 2\n\
         set 3\n\
         push\n\
         pop\n\
         syscall 1\n\
         pop\n\
         syscall 1\n\
         popRegister 0\n\
         swap 0\n\
         syscall 1\n\
         halt",
        "371",
    );
}

#[test]
fn division() {
    run_ok("set 17\nsetRegister 1 5\ndiv 1\nsyscall 1\nswap 1\nsyscall 1\nhalt", "32");
    run_ok("set -17\nsetRegister 1 5\ndiv 1\nsyscall 1\nswap 1\nsyscall 1\nhalt", "-3-2");
    run_fault("set 1\ndiv 3\nhalt", Fault::DivideByZero);
}

#[test]
fn conditional_jumps() {
    let source = |jump: &str, a: i32, b: i32| {
        format!(
            "set {a}\nsetRegister 0 {b}\ncompare 0\n{jump} taken\nset 0\nsyscall 1\nhalt\n\
             label taken\nset 1\nsyscall 1\nhalt"
        )
    };
    for (jump, a, b, taken) in [
        ("jumpLess", 1, 2, true),
        ("jumpLess", 2, 2, false),
        ("jumpGreater", 3, 2, true),
        ("jumpGreater", 2, 2, false),
        ("jumpLessEqual", 2, 2, true),
        ("jumpGreaterEqual", 1, 2, false),
        ("jumpNonzero", 1, 2, true),
        ("jumpNotEqual", 2, 2, false),
        ("jumpZero", 2, 2, true),
        ("jumpEqual", 1, 2, false),
        ("jumpLess", i32::MIN, 1, true),
        ("jumpGreater", i32::MAX, -1, true),
    ] {
        let (res, out) = run(&source(jump, a, b));
        assert_eq!(res, Ok(()));
        assert_eq!(out, if taken { "1" } else { "0" }, "{jump} {a} {b}");
    }
}

#[test]
fn condition_code_updates() {
    // side register arithmetic does not touch the condition code
    run_ok("set 0\nincrementRegister 0\njumpNonzero bad\nset 1\nsyscall 1\nhalt\nlabel bad\nhalt", "1");
    // add updates it
    run_ok("set -1\nsetRegister 0 1\nadd 0\njumpZero ok\nhalt\nlabel ok\nsyscall 1\nhalt", "0");
}

#[test]
fn memory_words() {
    run_ok("set -123456\nstore32 20\nset 0\nload32 20\nsyscall 1\nhalt", "-123456");
    run_ok("set 0x1234\nstore32 8\nsetRegister 2 8\nderef32 2\nsyscall 1\nhalt", "4660");
    // little-endian layout
    run_ok("set 0x1234\nstore32 8\nload8 8\nsyscall 1\nsetRegister 0 9\nderef8 0\nsyscall 1\nhalt", "5218");
}

#[test]
fn memory_bounds() {
    let program = Program::assemble("set 1\nstore32 60\nstore32 61\nhalt").unwrap();
    let config = CoreConfig { memory_size: 64, ..CoreConfig::default() };
    let (res, _) = exec(&program, config);
    assert_eq!(res, Err(Trap { pos: 2, fault: Fault::OutOfBounds(61) }));

    run_fault("store8 4096", Fault::OutOfBounds(4096));
    run_fault("setRegister 0 -1\nderef8 0", Fault::OutOfBounds(u32::MAX));
}

#[test]
fn data_segment_is_read_only() {
    let source = format!("label msg\ndataString hi\nset {RODATA_BASE}\nsyscall 0\nsetRegister 0 0\nwrite8 0\nhalt");
    let (res, out) = run(&source);
    assert_eq!(out, "hi\n");
    assert_eq!(res, Err(Trap { pos: 3, fault: Fault::ReadOnlyViolation(RODATA_BASE) }));
}

#[test]
fn invalid_register() {
    let trap = run_fault("nop\nswap 4\nhalt", Fault::InvalidRegister(4));
    assert_eq!(trap.pos, 1);
    run_fault("pushRegister 255", Fault::InvalidRegister(255));
}

#[test]
fn invalid_syscall() { run_fault("syscall 7", Fault::InvalidSyscall(7)); }

#[test]
fn invalid_opcode() {
    let mut image = Program::assemble("nop\nhalt").unwrap().to_image();
    // second instruction is the `halt` opcode right after the one-byte `nop`
    image[8] = 0xEE;
    let program = Program::from_image(image).unwrap();
    assert_eq!(program.code(), &[Instr::Nop, Instr::Reserved { opcode: 0xEE }]);
    let (res, _) = exec(&program, CoreConfig::default());
    assert_eq!(res, Err(Trap { pos: 1, fault: Fault::InvalidOpcode(0xEE) }));
}

#[test]
fn return_outside_of_code() {
    run_fault("set 70000\npush\nreturn", Fault::CodeOutOfBounds(70000));
    run_fault("label end_label_only\nnop\njump end\nlabel end", Fault::CodeOutOfBounds(2));
}

#[test]
fn undefined_label() {
    assert_eq!(
        Program::assemble("nop\ncall missing\nhalt"),
        Err(AsmError::Resolution(ResolutionError::Undefined { label: s("missing"), line: 2 }))
    );
}

#[test]
fn duplicate_label() {
    let err = Program::assemble(FUNCTION.replace("label main", "label greet").as_str()).unwrap_err();
    assert!(matches!(err, AsmError::Resolution(ResolutionError::Duplicate { .. })));
}

#[test]
fn labels() {
    let program = Program::assemble(FUNCTION).unwrap();
    assert_eq!(program.label("greet"), Some(Label::Code(1)));
    assert_eq!(program.label("main"), Some(Label::Code(5)));
    assert!(matches!(program.label("greeting"), Some(Label::Data(_))));
    assert_eq!(program.describe(3), "0003.h (greet+2)");
}

#[test]
fn stepping() {
    let program = Program::assemble(HELLO_WORLD).unwrap();
    let mut vm = Vm::new(&program, StdHost::new(Vec::<u8>::new()));
    let mut steps = 0;
    while vm.step().unwrap() {
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert_eq!(vm.state(), ExecState::Halted);
    assert_eq!(vm.core().cy(), 4);
    assert_eq!(&vm.memory().ram()[10..23], b"Hello world!\0");
}

fn s(s: &str) -> String { s.to_owned() }
